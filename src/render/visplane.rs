// src/render/visplane.rs

use log::debug;

use crate::render::texture::TextureId;

const INITIAL_PLANES: usize = 128;

/// What makes two floor or ceiling surfaces mergeable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneKey {
    pub texture: TextureId,
    pub height: f32,
    pub light: f32,
}

/// A floor or ceiling accumulated column by column during wall drawing and filled
/// row by row afterwards.
#[derive(Debug, Clone)]
pub struct VisPlane {
    pub key: PlaneKey,
    /// Still accepting columns. A closed plane is only drawn.
    pub open: bool,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    /// Inclusive row extents per column; `top > bottom` marks an unused column.
    top: Vec<i32>,
    bottom: Vec<i32>,
}

impl VisPlane {
    fn new(width: usize) -> Self {
        VisPlane {
            key: PlaneKey {
                texture: TextureId::NONE,
                height: 0.0,
                light: 0.0,
            },
            open: false,
            min_x: i32::MAX,
            max_x: i32::MIN,
            min_y: i32::MAX,
            max_y: i32::MIN,
            top: vec![i32::MAX; width],
            bottom: vec![i32::MIN; width],
        }
    }

    fn reset(&mut self, key: PlaneKey) {
        self.key = key;
        self.open = true;
        self.min_x = i32::MAX;
        self.max_x = i32::MIN;
        self.min_y = i32::MAX;
        self.max_y = i32::MIN;
        self.top.fill(i32::MAX);
        self.bottom.fill(i32::MIN);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn is_occupied(&self, x: i32) -> bool {
        let x = x as usize;
        self.top[x] <= self.bottom[x]
    }

    /// Inclusive rows of column `x`, if any.
    pub fn column(&self, x: i32) -> Option<(i32, i32)> {
        self.is_occupied(x)
            .then(|| (self.top[x as usize], self.bottom[x as usize]))
    }

    fn covers(&self, x: i32, y: i32) -> bool {
        let x = x as usize;
        self.top[x] <= y && y <= self.bottom[x]
    }

    /// Maximal runs of columns covering row `y`, as half-open `(start, end)` pairs.
    pub fn row_runs(&self, y: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        let mut x = self.min_x;
        std::iter::from_fn(move || {
            while x <= self.max_x && !self.covers(x, y) {
                x += 1;
            }
            if x > self.max_x {
                return None;
            }
            let start = x;
            while x <= self.max_x && self.covers(x, y) {
                x += 1;
            }
            Some((start, x))
        })
    }
}

/// Frame-scoped visplane storage. Capacity doubles on demand and survives frames.
#[derive(Debug, Default)]
pub struct VisPlanePool {
    planes: Vec<VisPlane>,
    count: usize,
    width: usize,
}

impl VisPlanePool {
    pub fn new(width: usize) -> Self {
        VisPlanePool {
            planes: Vec::new(),
            count: 0,
            width,
        }
    }

    /// Drops all planes; column arrays are reallocated at the new width on demand.
    pub fn resize(&mut self, width: usize) {
        self.planes.clear();
        self.count = 0;
        self.width = width;
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.planes.len()
    }

    pub fn planes(&self) -> &[VisPlane] {
        &self.planes[..self.count]
    }

    pub fn get(&self, index: usize) -> &VisPlane {
        &self.planes[index]
    }

    fn grow(&mut self) {
        let capacity = if self.planes.is_empty() {
            INITIAL_PLANES
        } else {
            self.planes.len() * 2
        };
        let width = self.width;
        self.planes.resize_with(capacity, || VisPlane::new(width));
        debug!("Visplane pool grown to {}", capacity);
    }

    fn alloc(&mut self, key: PlaneKey) -> usize {
        if self.count == self.planes.len() {
            self.grow();
        }
        let index = self.count;
        self.planes[index].reset(key);
        self.count += 1;
        index
    }

    /// The open plane for `key`, allocating one if there is none.
    pub fn find(&mut self, key: PlaneKey) -> usize {
        self.planes[..self.count]
            .iter()
            .position(|plane| plane.open && plane.key == key)
            .unwrap_or_else(|| self.alloc(key))
    }

    /// Returns a plane that may take columns `first..=last`: `plane` itself if none of
    /// them is taken yet, otherwise a fresh plane with the same key. The old plane is
    /// closed in that case.
    pub fn check(&mut self, plane: usize, first: i32, last: i32) -> usize {
        let taken = (first..=last).any(|x| self.planes[plane].is_occupied(x));
        if !taken {
            return plane;
        }

        self.planes[plane].open = false;
        let key = self.planes[plane].key;
        self.alloc(key)
    }

    /// Records inclusive rows `top..=bottom` for column `x`.
    pub fn mark(&mut self, plane: usize, x: i32, top: i32, bottom: i32) {
        if top > bottom {
            return;
        }
        let vp = &mut self.planes[plane];
        vp.top[x as usize] = top;
        vp.bottom[x as usize] = bottom;
        vp.min_x = vp.min_x.min(x);
        vp.max_x = vp.max_x.max(x);
        vp.min_y = vp.min_y.min(top);
        vp.max_y = vp.max_y.max(bottom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(height: f32) -> PlaneKey {
        PlaneKey {
            texture: TextureId::from_name("FLAT1"),
            height,
            light: 0.75,
        }
    }

    #[test]
    fn test_find_reuses_open_plane() {
        let mut pool = VisPlanePool::new(32);
        let a = pool.find(key(1.0));
        let b = pool.find(key(2.0));
        assert_ne!(a, b);
        assert_eq!(pool.find(key(1.0)), a);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.capacity(), INITIAL_PLANES);
    }

    #[test]
    fn test_check_splits_on_overlap() {
        let mut pool = VisPlanePool::new(32);
        let a = pool.find(key(1.0));
        assert_eq!(pool.check(a, 0, 9), a);
        for x in 0..10 {
            pool.mark(a, x, 20, 31);
        }

        // Disjoint columns stay on the same plane.
        assert_eq!(pool.check(a, 10, 15), a);

        // Overlapping columns get a new plane and close the old one.
        let b = pool.check(a, 5, 12);
        assert_ne!(a, b);
        assert!(!pool.get(a).open);
        assert!(pool.get(b).open);
        assert_eq!(pool.get(b).key, key(1.0));
        assert_eq!(pool.find(key(1.0)), b);

        let open_with_key = pool
            .planes()
            .iter()
            .filter(|p| p.open && p.key == key(1.0))
            .count();
        assert_eq!(open_with_key, 1);
    }

    #[test]
    fn test_mark_tracks_bounds_and_runs() {
        let mut pool = VisPlanePool::new(16);
        let p = pool.find(key(0.0));
        assert!(pool.get(p).is_empty());
        pool.mark(p, 2, 5, 9);
        pool.mark(p, 3, 6, 9);
        pool.mark(p, 6, 5, 7);
        pool.mark(p, 7, 4, 3);

        let plane = pool.get(p);
        assert_eq!((plane.min_x, plane.max_x), (2, 6));
        assert_eq!((plane.min_y, plane.max_y), (5, 9));
        assert_eq!(plane.column(3), Some((6, 9)));
        assert_eq!(plane.column(7), None);

        assert_eq!(plane.row_runs(5).collect::<Vec<_>>(), vec![(2, 3), (6, 7)]);
        assert_eq!(plane.row_runs(8).collect::<Vec<_>>(), vec![(2, 4)]);
        assert_eq!(plane.row_runs(12).count(), 0);
    }

    #[test]
    fn test_pool_doubles_and_keeps_capacity() {
        let mut pool = VisPlanePool::new(4);
        for i in 0..(INITIAL_PLANES + 1) {
            pool.find(key(i as f32));
        }
        assert_eq!(pool.capacity(), INITIAL_PLANES * 2);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), INITIAL_PLANES * 2);
        let p = pool.find(key(0.0));
        assert!(pool.get(p).is_empty());

        pool.resize(8);
        assert_eq!(pool.capacity(), 0);
    }
}
