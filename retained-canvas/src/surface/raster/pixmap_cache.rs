//! Bounded LRU cache for premultiplied image and pattern-tile pixmaps.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tiny_skia::Pixmap;

use crate::image::Image;
use crate::pattern::Repetition;

/// 64 MiB of pixel data.
pub(super) const DEFAULT_CACHE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct PixmapKey {
    pub(super) image_id: u64,
    /// `None` for the plain image pixmap.
    pub(super) repetition: Option<Repetition>,
    /// Surface dimensions the tile was extended for (0,0 when not extended).
    pub(super) width: u32,
    pub(super) height: u32,
}

impl PixmapKey {
    pub(super) fn image(image: &Image) -> Self {
        Self {
            image_id: image.id(),
            repetition: None,
            width: 0,
            height: 0,
        }
    }
}

/// Pixmaps kept by most recent use, bounded by their total byte size.
#[derive(Debug)]
pub(super) struct PixmapCache {
    capacity: usize,
    used: usize,
    /// Least recently used first.
    order: VecDeque<PixmapKey>,
    pixmaps: HashMap<PixmapKey, Arc<Pixmap>>,
}

impl PixmapCache {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            order: VecDeque::new(),
            pixmaps: HashMap::new(),
        }
    }

    pub(super) fn clear(&mut self) {
        self.pixmaps.clear();
        self.order.clear();
        self.used = 0;
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pixmaps.len()
    }

    fn touch(&mut self, key: PixmapKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }

    /// The cached pixmap for `key`, or the one `create` builds. Pixmaps
    /// larger than the whole capacity are returned without being kept.
    pub(super) fn get_or_insert(
        &mut self,
        key: PixmapKey,
        create: impl FnOnce() -> Option<Pixmap>,
    ) -> Option<Arc<Pixmap>> {
        if let Some(hit) = self.pixmaps.get(&key).cloned() {
            self.touch(key);
            return Some(hit);
        }

        let pixmap = Arc::new(create()?);
        let bytes = pixmap.data().len();
        if bytes > self.capacity {
            log::debug!(target: "surface", "{bytes} byte pixmap bypasses the cache");
            return Some(pixmap);
        }
        while self.used + bytes > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.pixmaps.remove(&oldest) {
                self.used -= evicted.data().len();
            }
        }
        self.used += bytes;
        self.pixmaps.insert(key, Arc::clone(&pixmap));
        self.order.push_back(key);
        Some(pixmap)
    }
}

/// Build the pixmap a pattern shader samples from.
///
/// `Repeat` uses the image itself with a repeating spread. The other modes
/// lay out enough tiles along the repeating axis to cover a `width` x
/// `height` surface, framed by one transparent pixel on every non-repeating
/// edge so a padding spread extends transparency. The first tile sits at
/// [`tile_offset`].
pub(super) fn tile_pixmap(
    base: &Pixmap,
    repetition: Repetition,
    width: u32,
    height: u32,
) -> Option<Pixmap> {
    if repetition == Repetition::Repeat {
        return Some(base.clone());
    }

    let (pw, ph) = (base.width(), base.height());
    let (pad_x, pad_y) = tile_offset(repetition);
    let tiles_x = if repetition.repeats_x() { width / pw + 2 } else { 1 };
    let tiles_y = if repetition.repeats_y() { height / ph + 2 } else { 1 };

    let mut extended = Pixmap::new(pw * tiles_x + pad_x * 2, ph * tiles_y + pad_y * 2)?;
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            extended.draw_pixmap(
                (pad_x + tx * pw) as i32,
                (pad_y + ty * ph) as i32,
                base.as_ref(),
                &tiny_skia::PixmapPaint::default(),
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }
    Some(extended)
}

/// Position of the first tile inside a [`tile_pixmap`].
pub(super) fn tile_offset(repetition: Repetition) -> (u32, u32) {
    (
        u32::from(!repetition.repeats_x()),
        u32::from(!repetition.repeats_y()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> PixmapKey {
        PixmapKey {
            image_id: id,
            repetition: None,
            width: 0,
            height: 0,
        }
    }

    #[test]
    fn test_cache_hit_reuses_pixmap() {
        let mut cache = PixmapCache::new(1024);
        let a = cache.get_or_insert(key(1), || Pixmap::new(2, 2)).unwrap();
        let b = cache
            .get_or_insert(key(1), || panic!("should be cached"))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        // Each 4x4 pixmap is 64 bytes.
        let mut cache = PixmapCache::new(128);
        cache.get_or_insert(key(1), || Pixmap::new(4, 4));
        cache.get_or_insert(key(2), || Pixmap::new(4, 4));
        cache.get_or_insert(key(1), || Pixmap::new(4, 4));
        cache.get_or_insert(key(3), || Pixmap::new(4, 4));
        assert_eq!(cache.len(), 2);
        assert!(cache.pixmaps.contains_key(&key(1)));
        assert!(!cache.pixmaps.contains_key(&key(2)));
    }

    #[test]
    fn test_oversize_not_cached() {
        let mut cache = PixmapCache::new(16);
        assert!(cache.get_or_insert(key(1), || Pixmap::new(4, 4)).is_some());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_tile_pixmap_no_repeat_is_framed() {
        let mut base = Pixmap::new(2, 2).unwrap();
        base.fill(tiny_skia::Color::WHITE);
        let tile = tile_pixmap(&base, Repetition::NoRepeat, 10, 10).unwrap();
        assert_eq!((tile.width(), tile.height()), (4, 4));
        assert_eq!(tile_offset(Repetition::NoRepeat), (1, 1));
        assert_eq!(tile.pixel(0, 0).unwrap().alpha(), 0);
        assert_eq!(tile.pixel(1, 1).unwrap().alpha(), 255);
    }

    #[test]
    fn test_tile_pixmap_repeat_x_covers_width() {
        let base = Pixmap::new(3, 2).unwrap();
        let tile = tile_pixmap(&base, Repetition::RepeatX, 10, 10).unwrap();
        assert_eq!(tile.width(), 3 * 5);
        assert_eq!(tile.height(), 4);
        assert_eq!(tile_offset(Repetition::RepeatX), (0, 1));
    }
}
