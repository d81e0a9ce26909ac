/*
 * @Author       : 老董
 * @Date         : 2026-09-06
 * @Description  : 优化器模块：逐参数的更新规则（SGD/RMSProp/Adam）
 */

mod core;

pub use self::core::{Adam, Moment, Optimizer, OptimizerConfig, RMSProp, SGD};
