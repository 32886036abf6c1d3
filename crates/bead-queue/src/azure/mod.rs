//! Azure Service Bus over its REST surface.
//!
//! ## Addressing
//!
//! Every command targets `https://{namespace}.servicebus.windows.net/{queue}/messages`
//! plus an operation-specific suffix:
//!
//! | Operation  | Method | Suffix                |
//! |------------|--------|-----------------------|
//! | Peek       | POST   | `/head`               |
//! | Receive    | DELETE | `/head`               |
//! | Send       | POST   |                       |
//! | BatchSend  | POST   |                       |
//! | Delete     | DELETE | `/{id}/{lockToken}`   |
//! | Release    | PUT    | `/{id}/{lockToken}`   |
//! | RenewLock  | POST   | `/{id}/{lockToken}`   |
//! | Unlock     | PUT    | `/{id}/{lockToken}`   |
//!
//! ## Layers
//!
//! - [`commands`] - immutable command values that build requests and parse responses
//! - [`transport`] - the [`RestTransport`] seam and its reqwest implementation
//! - [`queue`] - [`AzureServiceBusQueue`], the `Queue` implementation tying both together

pub mod commands;
pub mod endpoint;
pub mod queue;
pub mod transport;

pub use commands::{
    BatchSendCommand, DeleteCommand, HttpMethod, PeekCommand, PutCommand, ReceiveCommand,
    ReleaseCommand, RenewLockCommand, RestCommand, RestRequest, RestResponse, SendCommand,
    UnlockCommand,
};
pub use endpoint::QueueEndpoint;
pub use queue::AzureServiceBusQueue;
pub use transport::{execute, HttpTransport, RestTransport};
