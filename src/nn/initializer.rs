/*
 * @Author       : 老董
 * @Date         : 2026-09-05
 * @Description  : 权重初始化器：根据扇入/扇出抽取初始权重（或卷积核数值）
 */

use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializerType {
    #[default]
    XavierNormal,
    XavierUniform,
    HeNormal,
    HeUniform,
}

impl InitializerType {
    pub fn build(self) -> Initializer {
        Initializer::new(self)
    }

    pub fn build_seeded(self, seed: u64) -> Initializer {
        Initializer::seeded(self, seed)
    }
}

/// 权重初始化器，内部持有自己的随机数生成器（可指定种子以便复现）
#[derive(Debug, Clone)]
pub struct Initializer {
    kind: InitializerType,
    rng: StdRng,
}

impl Initializer {
    pub fn new(kind: InitializerType) -> Self {
        Self {
            kind,
            rng: StdRng::from_entropy(),
        }
    }

    /// 创建带种子的初始化器，确保可重复性
    pub fn seeded(kind: InitializerType, seed: u64) -> Self {
        Self {
            kind,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub const fn kind(&self) -> InitializerType {
        self.kind
    }

    /// 抽取一个初始值
    /// * `fan_in` - 输入连接数
    /// * `fan_out` - 输出连接数
    pub fn draw(&mut self, fan_in: usize, fan_out: usize) -> f32 {
        let fan_in = fan_in.max(1) as f32;
        let fan_out = fan_out.max(1) as f32;
        match self.kind {
            InitializerType::XavierNormal => self.normal((2. / (fan_in + fan_out)).sqrt()),
            InitializerType::XavierUniform => self.uniform((6. / (fan_in + fan_out)).sqrt()),
            InitializerType::HeNormal => self.normal((2. / fan_in).sqrt()),
            InitializerType::HeUniform => self.uniform((6. / fan_in).sqrt()),
        }
    }

    fn uniform(&mut self, limit: f32) -> f32 {
        Uniform::from(-limit..=limit).sample(&mut self.rng)
    }

    // Box-Muller变换
    fn normal(&mut self, std_dev: f32) -> f32 {
        let unit = Uniform::new(f32::EPSILON, 1.);
        let u1 = unit.sample(&mut self.rng);
        let u2 = unit.sample(&mut self.rng);
        let r = (-2. * u1.ln()).sqrt();
        let theta = 2. * std::f32::consts::PI * u2;
        std_dev * r * theta.cos()
    }
}

impl Default for Initializer {
    fn default() -> Self {
        Self::new(InitializerType::default())
    }
}
