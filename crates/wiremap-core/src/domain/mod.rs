//! Domain model (ids, request, response, errors, task, state, outcome).

pub mod cancel;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod request;
pub mod response;
pub mod state;
pub mod task;

pub use self::cancel::{CancelHandle, CancelSignal};
pub use self::errors::{ApiError, ErrorKind, TransformError};
pub use self::ids::TaskId;
pub use self::outcome::TaskOutcome;
pub use self::request::{HttpMethod, Request};
pub use self::response::{RawResponse, TaskResponse, TransportFailure};
pub use self::state::TaskState;
pub use self::task::{ResponseType, RetriableTask, RetryContext, SubTask};
