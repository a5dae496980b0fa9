pub mod admin_user;
pub mod order;
pub mod product;
pub mod support;
pub mod tally;
pub mod user;

pub use admin_user::{AdminRole, AdminUser, CreateAdminUser};
pub use order::{CreateOrder, Order, OrderItem, OrderStatus, PaymentStatus, UpdateOrder};
pub use product::{CreateProduct, Product, ProductCategory, UpdateProduct};
pub use support::{CreateResponse, CreateTicket, SupportResponse, SupportTicket, TicketStatus};
pub use tally::{CreateTallyEntry, TallyEntry, TallyItem};
pub use user::{CreateMember, Member, User, UserRole};
