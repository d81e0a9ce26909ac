/*
 * @Author       : 老董
 * @Date         : 2026-09-22
 * @Description  : 卷积层（"same"零填充、步长1的二维互相关）
 *
 * - 输入形状：(rows, columns, depth)
 * - 卷积核形状：(filter_rows, filter_columns, depth)，深度必须与输入一致
 * - 输出形状：(rows, columns, filter_count)，每个卷积核一个可学习偏置
 * - 训练模式的前向会缓存输入与激活前的值，用于反向传播
 */

use super::TensorLobe;
use crate::errors::{ComparisonOperator, NeuronError, NeuronResult};
use crate::nn::optimizer::{Moment, Optimizer};
use crate::nn::{Activation, ConvolutionalLobeModel, Initializer};
use crate::tensor::{Tensor, TensorSize};

#[derive(Debug, Clone)]
pub struct ConvolutionalLobe {
    input_size: TensorSize,
    filter_size: TensorSize,
    filter_count: usize,
    activation: Activation,
    initial_bias: f32,
    learning_rate: f32,
    filters: Vec<Tensor>,
    biases: Vec<f32>,
    filter_gradients: Vec<Tensor>,
    bias_gradients: Vec<f32>,
    filter_moments: Vec<Vec<Moment>>,
    bias_moments: Vec<Moment>,
    cached_input: Option<Tensor>,
    cached_pre_activations: Option<Tensor>,
}

impl ConvolutionalLobe {
    pub fn new(
        model: ConvolutionalLobeModel,
        learning_rate: f32,
        initializer: &mut Initializer,
    ) -> NeuronResult<Self> {
        if model.filter_size.depth != model.input_size.depth {
            return Err(NeuronError::ShapeMismatch {
                expected: vec![model.input_size.depth],
                got: vec![model.filter_size.depth],
                message: "卷积核深度须等于输入深度".to_string(),
            });
        }
        if model.filter_count == 0 {
            return Err(NeuronError::ValueMustSatisfyComparison {
                value_name: "卷积核个数".to_string(),
                operator: ComparisonOperator::GreaterThan,
                threshold: 0,
            });
        }
        if model.filter_size.rows == 0 || model.filter_size.columns == 0 {
            return Err(NeuronError::Configuration(format!(
                "卷积核尺寸须大于0：{:?}",
                model.filter_size
            )));
        }

        let filter_size = model.filter_size;
        let mut lobe = Self {
            input_size: model.input_size,
            filter_size,
            filter_count: model.filter_count,
            activation: model.activation,
            initial_bias: model.bias,
            learning_rate,
            filters: vec![Tensor::zeros(filter_size); model.filter_count],
            biases: vec![model.bias; model.filter_count],
            filter_gradients: vec![Tensor::zeros(filter_size); model.filter_count],
            bias_gradients: vec![0.; model.filter_count],
            filter_moments: vec![vec![Moment::default(); filter_size.len()]; model.filter_count],
            bias_moments: vec![Moment::default(); model.filter_count],
            cached_input: None,
            cached_pre_activations: None,
        };
        lobe.randomize(initializer);
        Ok(lobe)
    }

    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn filter_gradients(&self) -> &[Tensor] {
        &self.filter_gradients
    }

    pub fn bias_gradients(&self) -> &[f32] {
        &self.bias_gradients
    }

    pub const fn filter_size(&self) -> TensorSize {
        self.filter_size
    }

    pub const fn filter_count(&self) -> usize {
        self.filter_count
    }

    pub fn replace_filters(&mut self, filters: Vec<Tensor>) -> NeuronResult<()> {
        if filters.len() != self.filter_count {
            return Err(NeuronError::width_mismatch(
                self.filter_count,
                filters.len(),
                "卷积核个数不符",
            ));
        }
        if let Some(filter) = filters.iter().find(|f| f.size() != self.filter_size) {
            return Err(NeuronError::ShapeMismatch {
                expected: self.filter_size.to_vec(),
                got: filter.size().to_vec(),
                message: "卷积核形状不符".to_string(),
            });
        }
        self.filters = filters;
        Ok(())
    }

    fn randomize(&mut self, initializer: &mut Initializer) {
        let fan_in = self.filter_size.len();
        let fan_out = self.filter_size.rows * self.filter_size.columns * self.filter_count;
        for filter in &mut self.filters {
            for value in filter.iter_mut() {
                *value = initializer.draw(fan_in, fan_out);
            }
        }
    }

    const fn padding(&self) -> (isize, isize) {
        (
            (self.filter_size.rows as isize - 1) / 2,
            (self.filter_size.columns as isize - 1) / 2,
        )
    }

    fn check_size(expected: TensorSize, got: TensorSize, message: &str) -> NeuronResult<()> {
        if expected != got {
            return Err(NeuronError::ShapeMismatch {
                expected: expected.to_vec(),
                got: got.to_vec(),
                message: message.to_string(),
            });
        }
        Ok(())
    }
}

impl TensorLobe for ConvolutionalLobe {
    fn feed(&mut self, input: &Tensor, training: bool) -> NeuronResult<Tensor> {
        Self::check_size(self.input_size, input.size(), "卷积层的输入形状不符")?;

        let (pad_r, pad_c) = self.padding();
        let out_size = self.output_size();
        let mut pre_activations = Tensor::zeros(out_size);

        for (k, filter) in self.filters.iter().enumerate() {
            for r in 0..out_size.rows {
                for c in 0..out_size.columns {
                    let mut sum = self.biases[k];
                    for d in 0..self.filter_size.depth {
                        for fr in 0..self.filter_size.rows {
                            for fc in 0..self.filter_size.columns {
                                let ir = r as isize + fr as isize - pad_r;
                                let ic = c as isize + fc as isize - pad_c;
                                sum += filter[[d, fr, fc]] * input.get_padded(d, ir, ic);
                            }
                        }
                    }
                    pre_activations[[k, r, c]] = sum;
                }
            }
        }

        let activation = self.activation;
        let output = pre_activations.map(|z| activation.apply(z));
        if training {
            self.cached_input = Some(input.clone());
            self.cached_pre_activations = Some(pre_activations);
        } else {
            self.cached_input = None;
            self.cached_pre_activations = None;
        }
        Ok(output)
    }

    fn calculate_gradients(&mut self, deltas: &Tensor) -> NeuronResult<Tensor> {
        Self::check_size(self.output_size(), deltas.size(), "卷积层收到的delta形状不符")?;
        let (Some(input), Some(pre_activations)) =
            (self.cached_input.as_ref(), self.cached_pre_activations.as_ref())
        else {
            return Err(NeuronError::MissingForwardState(
                "卷积层在训练模式的前向之前被要求计算梯度".to_string(),
            ));
        };

        let (pad_r, pad_c) = self.padding();
        let out_size = self.output_size();
        let mut input_gradients = Tensor::zeros(self.input_size);

        for k in 0..self.filter_count {
            for r in 0..out_size.rows {
                for c in 0..out_size.columns {
                    let dz = deltas[[k, r, c]] * self.activation.derivative(pre_activations[[k, r, c]]);
                    if dz == 0. {
                        continue;
                    }
                    self.bias_gradients[k] += dz;
                    for d in 0..self.filter_size.depth {
                        for fr in 0..self.filter_size.rows {
                            for fc in 0..self.filter_size.columns {
                                let ir = r as isize + fr as isize - pad_r;
                                let ic = c as isize + fc as isize - pad_c;
                                self.filter_gradients[k][[d, fr, fc]] +=
                                    dz * input.get_padded(d, ir, ic);
                                // 输入梯度：等价于翻转卷积核后与delta做"full"互相关
                                if ir >= 0
                                    && ic >= 0
                                    && (ir as usize) < self.input_size.rows
                                    && (ic as usize) < self.input_size.columns
                                {
                                    input_gradients[[d, ir as usize, ic as usize]] +=
                                        dz * self.filters[k][[d, fr, fc]];
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(input_gradients)
    }

    fn adjust_weights(&mut self, batch_size: usize, optimizer: &dyn Optimizer) {
        if batch_size == 0 {
            return;
        }
        let scale = 1. / batch_size as f32;
        for k in 0..self.filter_count {
            for ((weight, gradient), moment) in self.filters[k]
                .iter_mut()
                .zip(self.filter_gradients[k].iter())
                .zip(self.filter_moments[k].iter_mut())
            {
                *weight = optimizer.run(moment, *weight, gradient * scale, self.learning_rate);
            }
            self.biases[k] = optimizer.run(
                &mut self.bias_moments[k],
                self.biases[k],
                self.bias_gradients[k] * scale,
                self.learning_rate,
            );
        }
    }

    fn zero_gradients(&mut self) {
        for gradient in &mut self.filter_gradients {
            gradient.fill(0.);
        }
        self.bias_gradients.iter_mut().for_each(|g| *g = 0.);
    }

    fn clear(&mut self, initializer: &mut Initializer) {
        self.randomize(initializer);
        self.biases.iter_mut().for_each(|b| *b = self.initial_bias);
        self.zero_gradients();
        for moments in &mut self.filter_moments {
            moments.iter_mut().for_each(|m| *m = Moment::default());
        }
        self.bias_moments.iter_mut().for_each(|m| *m = Moment::default());
        self.cached_input = None;
        self.cached_pre_activations = None;
    }

    fn input_size(&self) -> TensorSize {
        self.input_size
    }

    fn output_size(&self) -> TensorSize {
        TensorSize::new(self.input_size.rows, self.input_size.columns, self.filter_count)
    }
}
