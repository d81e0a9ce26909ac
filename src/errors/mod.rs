/*
 * @Author       : 老董
 * @Date         : 2026-09-02
 * @Description  : 神经网络引擎的错误类型
 *
 * 分类：
 * - Configuration：不可恢复的配置错误（如编译时没有任何层），在`compile()`处直接panic
 * - ShapeMismatch：输入/标签/张量尺寸与声明的宽度不符，可恢复
 * - NotCompiled：编译前就调用了前向或训练，可恢复
 * - MissingForwardState：反向传播时缺少训练前向的缓存，可恢复
 */

use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeuronError {
    #[error("配置错误：{0}")]
    Configuration(String),

    // 数字比较用
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: usize,
    },

    #[error("{message}：预期形状为{expected:?}，实际为{got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },

    #[error("网络尚未编译，请先调用`compile()`")]
    NotCompiled,

    #[error("缺少前向传播缓存：{0}")]
    MissingForwardState(String),

    #[error("训练数据为空")]
    EmptyDataset,
}

pub type NeuronResult<T> = Result<T, NeuronError>;

impl NeuronError {
    /// 便捷构造：一维宽度不匹配（如输入向量长度与输入层节点数不符）
    pub fn width_mismatch(expected: usize, got: usize, message: &str) -> Self {
        Self::ShapeMismatch {
            expected: vec![expected],
            got: vec![got],
            message: message.to_string(),
        }
    }

    /// 是否为可恢复错误（只有配置错误不可恢复）
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}
