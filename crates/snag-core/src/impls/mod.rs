//! Impls - ports の実装
//!
//! - InMemoryStateStore: 開発・テスト用
//! - JsonFileStateStore: 本番用（1 ファイルの JSON レコード）
//! - LogNotifier / TelegramNotifier: 通知
//! - OciCliAllocator: `oci` CLI 経由で Oracle Cloud を叩く allocator

pub mod inmem_state_store;
pub mod json_state_store;
pub mod log_notifier;
pub mod telegram;
pub mod oci;

pub use self::inmem_state_store::InMemoryStateStore;
pub use self::json_state_store::JsonFileStateStore;
pub use self::log_notifier::LogNotifier;
pub use self::telegram::TelegramNotifier;
pub use self::oci::{OciCliAllocator, OciSettings};
