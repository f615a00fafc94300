// ============================================
// Height Field - Плотная карта высот
// ============================================
// Расширенное пространство: игровая зона + бордюр extension_size.
// Индекс z * width + x, один сэмпл на мировую единицу.
// Мир центрирован: сэмпл (0,0) = мировая точка (-width/2, -depth/2)

use ndshape::{RuntimeShape, Shape};

/// Мировая координата тайла вдоль одной оси
#[inline]
pub fn tile_to_world(tile: i32, grid_size: u32, extension_size: u32, extended_size: usize) -> f32 {
    (tile * grid_size as i32 + extension_size as i32) as f32 - extended_size as f32 * 0.5
}

/// Карта высот (каждая ячейка инициализирована)
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: usize,
    depth: usize,
    extension_size: usize,
    heights: Vec<f32>,
}

impl HeightField {
    /// Карта, заполненная одной высотой
    pub fn new(width: usize, depth: usize, extension_size: usize, fill: f32) -> Self {
        Self {
            width,
            depth,
            extension_size,
            heights: vec![fill; width * depth],
        }
    }

    /// Карта из готовых значений (None при несовпадении размеров)
    pub fn from_values(width: usize, depth: usize, extension_size: usize, heights: Vec<f32>) -> Option<Self> {
        if heights.len() != width * depth {
            return None;
        }
        Some(Self { width, depth, extension_size, heights })
    }

    /// Форма для линеаризации (x - быстрая ось)
    #[inline]
    pub fn shape(&self) -> RuntimeShape<u32, 2> {
        RuntimeShape::<u32, 2>::new([self.width as u32, self.depth as u32])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn extension_size(&self) -> usize {
        self.extension_size
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.heights
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    /// Сэмпл в координатах карты (None вне карты)
    #[inline]
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        let i = self.shape().linearize([x as u32, z as u32]) as usize;
        Some(self.heights[i])
    }

    #[inline]
    pub fn set(&mut self, x: usize, z: usize, h: f32) {
        if x < self.width && z < self.depth {
            let i = self.shape().linearize([x as u32, z as u32]) as usize;
            self.heights[i] = h;
        }
    }

    /// Лежит ли сэмпл внутри игровой зоны
    #[inline]
    pub fn is_playable(&self, x: usize, z: usize) -> bool {
        let e = self.extension_size;
        x >= e && z >= e && x + e < self.width && z + e < self.depth
    }

    /// Мировые (x, z) -> координаты карты
    #[inline]
    pub fn world_to_field(&self, wx: f32, wz: f32) -> (f32, f32) {
        (wx + self.width as f32 * 0.5, wz + self.depth as f32 * 0.5)
    }

    /// Координаты карты -> мировые (x, z)
    #[inline]
    pub fn field_to_world(&self, x: f32, z: f32) -> (f32, f32) {
        (x - self.width as f32 * 0.5, z - self.depth as f32 * 0.5)
    }

    /// Высота ближайшего сэмпла (с зажатием на краях)
    pub fn height_at_world(&self, wx: f32, wz: f32) -> f32 {
        if self.heights.is_empty() {
            return 0.0;
        }
        let (fx, fz) = self.world_to_field(wx, wz);
        let x = (fx.floor().max(0.0) as usize).min(self.width - 1);
        let z = (fz.floor().max(0.0) as usize).min(self.depth - 1);
        self.heights[z * self.width + x]
    }

    /// Билинейная интерполяция между четырьмя сэмплами
    pub fn sample_bilinear(&self, wx: f32, wz: f32) -> f32 {
        if self.heights.is_empty() {
            return 0.0;
        }
        let (fx, fz) = self.world_to_field(wx, wz);
        let max_x = (self.width - 1) as f32;
        let max_z = (self.depth - 1) as f32;
        let fx = fx.clamp(0.0, max_x);
        let fz = fz.clamp(0.0, max_z);

        let x0 = fx.floor() as usize;
        let z0 = fz.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let z1 = (z0 + 1).min(self.depth - 1);
        let tx = fx - x0 as f32;
        let tz = fz - z0 as f32;

        let h00 = self.heights[z0 * self.width + x0];
        let h10 = self.heights[z0 * self.width + x1];
        let h01 = self.heights[z1 * self.width + x0];
        let h11 = self.heights[z1 * self.width + x1];

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * tz
    }

    /// Минимум и максимум высот
    pub fn min_max(&self) -> (f32, f32) {
        self.heights.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}
