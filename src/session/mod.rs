pub mod gateway;
pub mod machine;

pub use gateway::{
    ApprovingGateway, ProviderGateway, PushOutcome, RejectingGateway, ScriptedGateway,
    SettleOutcome,
};
pub use machine::{PaymentSession, PushTicket, SessionState};
