pub mod function;
pub mod header;
pub mod item;
pub mod message;
pub mod return_code;
pub mod setup;
pub mod write_var;

pub use function::Function;
pub use header::{Header, MessageType};
pub use item::{AnyAddress, Area, DataTransportSize, TransportSize, MAX_BYTE_ADDRESS};
pub use message::Message;
pub use return_code::ReturnCode;
pub use setup::SetupCommunication;
pub use write_var::{WriteVarRequest, WriteVarResponse, WRITE_VAR_OVERHEAD};
