/*
 * @Author       : 老董
 * @Date         : 2026-09-02
 * @Description  : 三维张量：卷积、池化、展平各阶段之间传递的数据
 */

use ndarray::{Array3, Axis};

use crate::errors::{NeuronError, NeuronResult};

mod index;
mod shape;

pub use shape::TensorSize;

#[cfg(test)]
mod tests;

/// 三维张量，形状记为`(rows, columns, depth)`。
/// 内部按`[depth, row, column]`排布（通道优先），因此展平后的顺序是
/// “先深度、再行、再列”的行优先顺序。
/// 注：张量必须是规整的（每个深度切片的行列数一致），构造时即保证这一点。
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array3<f32>,
}

impl Tensor {
    /// 创建一个全零张量
    pub fn zeros(size: TensorSize) -> Tensor {
        Tensor {
            data: Array3::zeros((size.depth, size.rows, size.columns)),
        }
    }

    /// 以给定的值填满整个张量
    pub fn filled(size: TensorSize, value: f32) -> Tensor {
        Tensor {
            data: Array3::from_elem((size.depth, size.rows, size.columns), value),
        }
    }

    /// 由行优先（深度→行→列）展平的数据创建张量。
    /// `data`的长度必须等于`size.len()`，否则返回`ShapeMismatch`。
    pub fn from_vec(data: Vec<f32>, size: TensorSize) -> NeuronResult<Tensor> {
        if data.len() != size.len() {
            return Err(NeuronError::ShapeMismatch {
                expected: size.to_vec(),
                got: vec![data.len()],
                message: "展平数据的长度与张量尺寸不符".to_string(),
            });
        }
        let data = Array3::from_shape_vec((size.depth, size.rows, size.columns), data)
            .map_err(|e| NeuronError::ShapeMismatch {
                expected: size.to_vec(),
                got: vec![],
                message: e.to_string(),
            })?;
        Ok(Tensor { data })
    }

    /// 由嵌套向量`[depth][row][column]`创建张量，锯齿状的输入会返回`ShapeMismatch`
    pub fn from_nested(nested: Vec<Vec<Vec<f32>>>) -> NeuronResult<Tensor> {
        let depth = nested.len();
        let rows = nested.first().map_or(0, Vec::len);
        let columns = nested
            .first()
            .and_then(|slice| slice.first())
            .map_or(0, Vec::len);
        let size = TensorSize::new(rows, columns, depth);

        let mut flat = Vec::with_capacity(size.len());
        for (d, slice) in nested.into_iter().enumerate() {
            if slice.len() != rows {
                return Err(NeuronError::ShapeMismatch {
                    expected: vec![rows],
                    got: vec![slice.len()],
                    message: format!("第{d}个深度切片的行数不一致"),
                });
            }
            for (r, row) in slice.into_iter().enumerate() {
                if row.len() != columns {
                    return Err(NeuronError::ShapeMismatch {
                        expected: vec![columns],
                        got: vec![row.len()],
                        message: format!("第{d}个深度切片第{r}行的列数不一致"),
                    });
                }
                flat.extend(row);
            }
        }
        Tensor::from_vec(flat, size)
    }

    /// 转回嵌套向量`[depth][row][column]`
    pub fn to_nested(&self) -> Vec<Vec<Vec<f32>>> {
        self.data
            .axis_iter(Axis(0))
            .map(|slice| {
                slice
                    .axis_iter(Axis(0))
                    .map(|row| row.to_vec())
                    .collect()
            })
            .collect()
    }

    /// 行优先（深度→行→列）展平
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// 对每个元素应用`f`，返回新张量
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            data: self.data.mapv(f),
        }
    }

    /// 所有元素之和
    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 将所有元素置为`value`
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// 元素迭代器（行优先）
    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.data.iter()
    }

    /// 可变元素迭代器（行优先）
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.data.iter_mut()
    }
}
