use serde::{Deserialize, Serialize};

use super::Tensor;
use crate::errors::{NeuronError, NeuronResult};

/// 张量尺寸`(rows, columns, depth)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSize {
    pub rows: usize,
    pub columns: usize,
    pub depth: usize,
}

impl TensorSize {
    pub const fn new(rows: usize, columns: usize, depth: usize) -> Self {
        Self {
            rows,
            columns,
            depth,
        }
    }

    /// 元素总数
    pub const fn len(&self) -> usize {
        self.rows * self.columns * self.depth
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 以`[rows, columns, depth]`的顺序输出
    pub fn to_vec(&self) -> Vec<usize> {
        vec![self.rows, self.columns, self.depth]
    }
}

impl From<(usize, usize, usize)> for TensorSize {
    fn from((rows, columns, depth): (usize, usize, usize)) -> Self {
        Self::new(rows, columns, depth)
    }
}

impl Tensor {
    pub fn size(&self) -> TensorSize {
        let (depth, rows, columns) = self.data.dim();
        TensorSize::new(rows, columns, depth)
    }

    /// 形状，顺序为`[rows, columns, depth]`
    pub fn shape(&self) -> [usize; 3] {
        let size = self.size();
        [size.rows, size.columns, size.depth]
    }

    /// 元素个数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 在元素总数不变的前提下改变尺寸
    pub fn reshape(&self, size: TensorSize) -> NeuronResult<Tensor> {
        if size.len() != self.len() {
            return Err(NeuronError::ShapeMismatch {
                expected: self.shape().to_vec(),
                got: size.to_vec(),
                message: "reshape前后元素个数必须一致".to_string(),
            });
        }
        Tensor::from_vec(self.to_vec(), size)
    }
}
