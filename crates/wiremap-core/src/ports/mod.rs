//! Ports - 外部との境界
//!
//! 各 trait は transport や delegate など、コアの外にある協力者への
//! インターフェースです。実装の詳細は `impls` かアプリケーション側に置きます。

pub mod clock;
pub mod delegate;
pub mod id_generator;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delegate::{NoDelegate, RecoveryTask, TaskRunnerDelegate};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::transport::Transport;
