// 存储模块 - 情绪记录的持久化

// 子模块
pub mod entry_store;

// 重新导出主要类型
pub use entry_store::EntryStore;
