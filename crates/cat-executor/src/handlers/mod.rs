//! Built-in handlers, one per catalog action, grouped by category.

mod communication;
mod context;
mod entities;
mod organization;
mod payments;
mod settings;

pub use communication::{PostTimelineUpdateHandler, SendMessageHandler};
pub use context::{ClearContextNotesHandler, SaveContextNoteHandler};
pub use entities::{ArchiveProductHandler, CreateProductHandler, UpdateProductHandler};
pub use organization::{CreateOrganizationHandler, InviteOrganizationMemberHandler};
pub use payments::{CreateInvoiceHandler, SendPaymentHandler};
pub use settings::UpdateNotificationSettingsHandler;
