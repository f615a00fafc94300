// ============================================
// Cliff Entities - Живые объекты утёсов
// ============================================
// Полный пересчёт: перед новой генерацией ВСЕ старые объекты
// уничтожаются, затем создаются новые. Инкрементального
// диффа нет, пересекающиеся генерации не поддерживаются.

use super::placer::CliffAtomPlacement;

/// Внешний создатель объектов (рендер/физика)
pub trait CliffSpawner {
    type Handle;

    fn spawn(&mut self, placement: &CliffAtomPlacement) -> Self::Handle;
    fn despawn(&mut self, handle: Self::Handle);
}

/// Набор живых объектов утёсов
pub struct CliffEntities<S: CliffSpawner> {
    spawner: S,
    live: Vec<S::Handle>,
    /// Номер генерации (инкрементируется при каждой перестройке)
    generation: u64,
}

impl<S: CliffSpawner> CliffEntities<S> {
    pub fn new(spawner: S) -> Self {
        Self {
            spawner,
            live: Vec::new(),
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Уничтожить все объекты
    pub fn clear(&mut self) {
        for handle in self.live.drain(..) {
            self.spawner.despawn(handle);
        }
    }

    /// Уничтожить старое и создать новое
    pub fn regenerate(&mut self, placements: &[CliffAtomPlacement]) {
        let destroyed = self.live.len();
        self.clear();

        self.live.reserve(placements.len());
        for placement in placements {
            let handle = self.spawner.spawn(placement);
            self.live.push(handle);
        }
        self.generation += 1;

        log::info!(
            "Cliff generation {}: destroyed {}, spawned {}",
            self.generation,
            destroyed,
            placements.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cliffs::CliffAtomType;

    /// Журнал вызовов спавнера
    #[derive(Default)]
    struct RecordingSpawner {
        next: u32,
        alive: Vec<u32>,
        log: Vec<String>,
    }

    impl CliffSpawner for RecordingSpawner {
        type Handle = u32;

        fn spawn(&mut self, _placement: &CliffAtomPlacement) -> u32 {
            self.next += 1;
            self.alive.push(self.next);
            self.log.push(format!("spawn {}", self.next));
            self.next
        }

        fn despawn(&mut self, handle: u32) {
            self.alive.retain(|&h| h != handle);
            self.log.push(format!("despawn {}", handle));
        }
    }

    fn atom(x: f32) -> CliffAtomPlacement {
        CliffAtomPlacement {
            atom: CliffAtomType::AtomTwo,
            world_x: x,
            world_y: 0.0,
            world_z: 0.0,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_regenerate_destroys_before_spawning() {
        let mut entities = CliffEntities::new(RecordingSpawner::default());
        entities.regenerate(&[atom(0.0), atom(1.0)]);
        entities.regenerate(&[atom(2.0)]);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities.generation(), 2);
        assert_eq!(entities.spawner().alive, vec![3]);
        assert_eq!(
            entities.spawner().log,
            vec!["spawn 1", "spawn 2", "despawn 1", "despawn 2", "spawn 3"]
        );
    }

    #[test]
    fn test_clear_removes_all() {
        let mut entities = CliffEntities::new(RecordingSpawner::default());
        entities.regenerate(&[atom(0.0)]);
        entities.clear();
        assert!(entities.is_empty());
        assert!(entities.spawner().alive.is_empty());
    }
}
