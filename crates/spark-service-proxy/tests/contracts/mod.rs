//! 代理契约测试集合。
//!
//! # 教案式说明
//! - **Why**：代理的价值全部在调用契约上（校验顺序、关闭语义、应答关联），任何回归都会让调用方
//!   收到错误通道上的结果，因此集中以契约测试守护；
//! - **How**：`dispatch` 与 `completion` 使用 `ManualEventBus` 精确控制投递与应答顺序；
//!   `end_to_end` 则在 `LocalEventBus` 上挂真实服务绑定；
//! - **What**：每个用例失败时 panic 并给出阶段性上下文。

mod completion;
mod dispatch;
mod end_to_end;
mod support;
