pub use codec::{decode, encode};
pub use response::{Response, ResponsePayload};
pub use status::ResponseStatus;

mod codec;
mod response;
mod status;
