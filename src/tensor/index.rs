use std::ops::{Index, IndexMut};

use super::Tensor;

// 索引顺序为`[depth, row, column]`，与内部排布一致
impl Index<[usize; 3]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; 3]) -> &f32 {
        &self.data[index]
    }
}

impl IndexMut<[usize; 3]> for Tensor {
    fn index_mut(&mut self, index: [usize; 3]) -> &mut f32 {
        &mut self.data[index]
    }
}

impl Tensor {
    /// 越界（含负坐标）时返回0，用于零填充的卷积
    pub(crate) fn get_padded(&self, depth: usize, row: isize, column: isize) -> f32 {
        let size = self.size();
        if row < 0 || column < 0 || row as usize >= size.rows || column as usize >= size.columns {
            return 0.0;
        }
        self.data[[depth, row as usize, column as usize]]
    }
}
