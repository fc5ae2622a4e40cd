//! Wire protocol: messages, states, request validation and the session.

mod message;
mod session;
mod state;
pub mod validation;

pub use message::{
    from_json, to_json, EquipmentMap, ErrorTypeEnum, ItemChoice, Message, MessageContainer,
    MetaInformationKey, ReplayInfo, RoleEnum, Statistics, StatisticsEntry, VictoryEnum,
};
pub use session::Session;
pub use state::{next_state, ProtocolState, RequestKind};
