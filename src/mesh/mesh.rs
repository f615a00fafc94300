// ============================================
// Mesh - Индексированный треугольный меш
// ============================================

use ultraviolet::Vec3;

use super::decimate::{DecimateError, MeshDecimator};

/// Вершина для GPU буфера
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Ограничивающий бокс (пересчитывается при смене топологии)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: [f32::MAX; 3],
        max: [f32::MIN; 3],
    };

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    #[inline]
    pub fn grow(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }
}

/// Треугольный меш. indices = None - неиндексированная геометрия
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    bounds: Aabb,
}

impl Mesh {
    /// Индексированный меш (нормали и бокс пересчитываются)
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            normals: Vec::new(),
            positions,
            uvs: None,
            indices: Some(indices),
            bounds: Aabb::EMPTY,
        };
        mesh.recompute_normals();
        mesh.recompute_bounds();
        mesh
    }

    /// Неиндексированный меш: каждые три позиции - треугольник
    pub fn non_indexed(positions: Vec<[f32; 3]>) -> Self {
        let mut mesh = Self {
            normals: vec![[0.0; 3]; positions.len()],
            positions,
            uvs: None,
            indices: None,
            bounds: Aabb::EMPTY,
        };
        mesh.recompute_bounds();
        mesh
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        if uvs.len() == self.positions.len() {
            self.uvs = Some(uvs);
        } else {
            log::warn!("UV count {} != vertex count {}, dropping uvs", uvs.len(), self.positions.len());
        }
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        self.indices.as_deref().unwrap_or(&[])
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Нормали вершин: сумма нормалей треугольников, взвешенная площадью
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![Vec3::zero(); self.positions.len()];

        for tri in self.indices().chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let p0 = Vec3::from(self.positions[a]);
            let p1 = Vec3::from(self.positions[b]);
            let p2 = Vec3::from(self.positions[c]);
            let n = (p1 - p0).cross(p2 - p0);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }

        self.normals = acc
            .into_iter()
            .map(|n| {
                if n.mag_sq() > 0.0 {
                    n.normalized().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }

    /// Пересчитать бокс по вершинам, на которые ссылаются индексы
    pub fn recompute_bounds(&mut self) {
        let mut bounds = Aabb::EMPTY;
        match &self.indices {
            Some(indices) => {
                for &i in indices {
                    if let Some(&p) = self.positions.get(i as usize) {
                        bounds.grow(p);
                    }
                }
            }
            None => {
                for &p in &self.positions {
                    bounds.grow(p);
                }
            }
        }
        self.bounds = bounds;
    }

    /// Упростить меш, удалив долю вершин target_reduction
    pub fn decimate(&mut self, target_reduction: f32) -> Result<usize, DecimateError> {
        let new_indices = MeshDecimator::new().decimate(
            &mut self.positions,
            self.indices.as_deref(),
            target_reduction,
        )?;
        let removed = self.triangle_count() - new_indices.len() / 3;
        self.indices = Some(new_indices);
        self.recompute_normals();
        self.recompute_bounds();
        Ok(removed)
    }

    /// Выкинуть вершины без ссылок, переиндексировать
    pub fn compact(&mut self) {
        let Some(indices) = &mut self.indices else {
            return;
        };

        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = self.uvs.as_ref().map(|_| Vec::new());

        for idx in indices.iter_mut() {
            let old = *idx as usize;
            if remap[old] == u32::MAX {
                remap[old] = positions.len() as u32;
                positions.push(self.positions[old]);
                normals.push(self.normals.get(old).copied().unwrap_or([0.0, 1.0, 0.0]));
                if let (Some(dst), Some(src)) = (uvs.as_mut(), self.uvs.as_ref()) {
                    dst.push(src[old]);
                }
            }
            *idx = remap[old];
        }

        self.positions = positions;
        self.normals = normals;
        self.uvs = uvs;
    }

    /// Вершины для GPU (без uv - нули)
    pub fn vertices(&self) -> Vec<MeshVertex> {
        (0..self.positions.len())
            .map(|i| MeshVertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: self.uvs.as_ref().map_or([0.0, 0.0], |uvs| uvs[i]),
            })
            .collect()
    }
}
