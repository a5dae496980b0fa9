use chrono::NaiveDateTime;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::db::TIMESTAMP_FORMAT;
use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus};

/// One row of the item table in an order email.
#[derive(Debug, Clone)]
pub struct EmailLine {
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    frontend_url: String,
}

impl EmailService {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        smtp_user: &str,
        smtp_pass: &str,
        from_email: &str,
        frontend_url: &str,
    ) -> AppResult<Self> {
        let creds = Credentials::new(smtp_user.to_string(), smtp_pass.to_string());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
            .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .port(smtp_port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from_email: from_email.to_string(),
            frontend_url: frontend_url.to_string(),
        })
    }

    pub async fn send_order_status(
        &self,
        to_email: &str,
        order: &Order,
        customer_name: &str,
        lines: &[EmailLine],
    ) -> AppResult<()> {
        let email = render_order_status(order, lines, customer_name, &self.frontend_url);
        tracing::info!(
            order = %order.order_number,
            status = order.order_status.as_str(),
            "Sending order status email"
        );
        self.send_email(to_email, &email.subject, &email.html).await
    }

    async fn send_email(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid from email: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

pub fn estimated_delivery(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Shipped => "1-2 hrs",
        OrderStatus::Delivered => "Delivered",
        OrderStatus::Cancelled => "Cancelled",
        OrderStatus::Pending | OrderStatus::Processing => "2-3 hrs",
    }
}

fn status_copy(status: OrderStatus) -> (&'static str, &'static str) {
    match status {
        OrderStatus::Pending => (
            "Your Order Has Been Received",
            "Thank you for your order. We've received it and will begin processing it shortly.",
        ),
        OrderStatus::Processing => (
            "Your Order Is Being Processed",
            "Good news! We're currently preparing your items for delivery.",
        ),
        OrderStatus::Shipped => (
            "Your Order Has Been Shipped",
            "Your order is on its way to you!",
        ),
        OrderStatus::Delivered => (
            "Your Order Has Been Delivered",
            "Your order has been delivered. We hope you enjoy your products!",
        ),
        OrderStatus::Cancelled => (
            "Your Order Has Been Cancelled",
            "Your order has been cancelled. If you have any questions, please contact our customer support.",
        ),
    }
}

/// The buyer's name, or the local part of their address when no name is on file.
pub fn customer_name(name: &str, email: &str) -> String {
    if !name.trim().is_empty() {
        return name.to_string();
    }
    email.split('@').next().unwrap_or(email).to_string()
}

fn kes(cents: i64) -> String {
    format!("KES {:.2}", cents as f64 / 100.0)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn order_date(created_at: &str) -> String {
    NaiveDateTime::parse_from_str(created_at, TIMESTAMP_FORMAT)
        .map(|ts| ts.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

pub fn render_order_status(
    order: &Order,
    lines: &[EmailLine],
    customer_name: &str,
    frontend_url: &str,
) -> RenderedEmail {
    let (title, message) = status_copy(order.order_status);
    let link = format!("{}/orders/{}", frontend_url.trim_end_matches('/'), order.order_number);

    let rows: String = lines
        .iter()
        .map(|line| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&line.name),
                line.quantity,
                kes(line.price_cents),
                kes(line.price_cents * line.quantity)
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>
        body {{ font-family: 'Poppins', Arial, sans-serif; background: #f6f9f4; padding: 20px; }}
        .container {{ max-width: 600px; margin: 0 auto; background: white; padding: 32px; }}
        h1 {{ color: #2f6b2f; font-size: 20px; }}
        table {{ width: 100%; border-collapse: collapse; margin-top: 16px; }}
        td, th {{ padding: 6px; border-bottom: 1px solid #eee; text-align: left; }}
        .footer {{ margin-top: 32px; font-size: 11px; color: #888; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p>Hello {name},</p>
        <p>{message}</p>
        <p><strong>Order Number:</strong> {number}</p>
        <p><strong>Order Date:</strong> {date}</p>
        <p><strong>Order Status:</strong> {status}</p>
        <p><strong>Total Amount:</strong> {total}</p>
        <p><strong>Estimated Delivery:</strong> {delivery}</p>
        <table>
            <tr><th>Item</th><th>Qty</th><th>Price</th><th>Total</th></tr>
            {rows}
        </table>
        <p><a href="{link}">View Order Details</a></p>
        <div class="footer">
            <p>Freshom Produce Market - Fresh From Nature Made For Home</p>
        </div>
    </div>
</body>
</html>"#,
        title = title,
        name = escape(customer_name),
        message = message,
        number = order.order_number,
        date = order_date(&order.created_at),
        status = order.order_status.as_str(),
        total = kes(order.total_cents),
        delivery = estimated_delivery(order.order_status),
        rows = rows,
        link = link,
    );

    RenderedEmail {
        subject: format!("Order Status Update: {}", order.order_number),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: "o1".to_string(),
            order_number: "ORD-2026-0042".to_string(),
            user_id: "u1".to_string(),
            total_cents: 123_450,
            delivery_option: "delivery".to_string(),
            payment_method: "mpesa".to_string(),
            payment_status: PaymentStatus::Paid,
            order_status: status,
            location: "Thika".to_string(),
            created_at: "2026-10-14 09:30:00".to_string(),
            updated_at: "2026-10-14 09:30:00".to_string(),
        }
    }

    #[test]
    fn delivery_estimate_follows_status() {
        assert_eq!(estimated_delivery(OrderStatus::Processing), "2-3 hrs");
        assert_eq!(estimated_delivery(OrderStatus::Shipped), "1-2 hrs");
        assert_eq!(estimated_delivery(OrderStatus::Delivered), "Delivered");
        assert_eq!(estimated_delivery(OrderStatus::Cancelled), "Cancelled");
        assert_eq!(estimated_delivery(OrderStatus::Pending), "2-3 hrs");
    }

    #[test]
    fn customer_name_falls_back_to_email_local_part() {
        assert_eq!(customer_name("Otieno", "otieno@example.com"), "Otieno");
        assert_eq!(customer_name("  ", "otieno@example.com"), "otieno");
    }

    #[test]
    fn renders_subject_total_and_link() {
        let lines = vec![EmailLine {
            name: "Eggs <tray>".to_string(),
            quantity: 2,
            price_cents: 45_000,
        }];
        let email = render_order_status(
            &order(OrderStatus::Shipped),
            &lines,
            "Otieno",
            "https://shop.freshom.test/",
        );

        assert_eq!(email.subject, "Order Status Update: ORD-2026-0042");
        assert!(email.html.contains("KES 1234.50"));
        assert!(email.html.contains("KES 900.00"));
        assert!(email.html.contains("1-2 hrs"));
        assert!(email.html.contains("Oct 14, 2026"));
        assert!(email.html.contains("https://shop.freshom.test/orders/ORD-2026-0042"));
        assert!(email.html.contains("Eggs &lt;tray&gt;"));
        assert!(email.html.contains("Your Order Has Been Shipped"));
    }
}
