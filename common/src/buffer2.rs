use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::slice;

/// Row-major 2D grid of samples. Pixel `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    /// Signed-coordinate access, `None` outside the grid.
    #[inline]
    pub fn try_get(&self, x: i64, y: i64) -> Option<&T> {
        if self.contains(x, y) {
            Some(&self.pixels[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn try_get_mut(&mut self, x: i64, y: i64) -> Option<&mut T> {
        if self.contains(x, y) {
            Some(&mut self.pixels[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.pixels.iter()
    }

    /// Builds a same-sized buffer by converting every sample.
    pub fn map<U, F>(&self, f: F) -> Buffer2<U>
    where
        F: FnMut(&T) -> U,
    {
        Buffer2 {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.pixels.fill(value);
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl<T> DerefMut for Buffer2<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}

impl<'a, T> IntoIterator for &'a Buffer2<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.len(), 6);
        assert!(!buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn test_new_panics_on_size_mismatch() {
        Buffer2::new(3, 2, vec![1, 2, 3]);
    }

    #[test]
    fn test_new_filled() {
        let buf = Buffer2::new_filled(2, 3, 255.0f32);
        assert_eq!(buf.len(), 6);
        assert!(buf.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn test_get_is_row_major() {
        // row 0 = [10, 20, 30], row 1 = [40, 50, 60]
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(*buf.get(2, 0), 30);
        assert_eq!(*buf.get(0, 1), 40);
        assert_eq!(buf[(2, 1)], 60);
        assert_eq!(buf.row(1), &[40, 50, 60]);
    }

    #[test]
    fn test_try_get_rejects_outside() {
        let buf = Buffer2::new(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(buf.try_get(1, 1), Some(&4));
        assert_eq!(buf.try_get(-1, 0), None);
        assert_eq!(buf.try_get(0, 2), None);
        assert_eq!(buf.try_get(2, 0), None);
    }

    #[test]
    fn test_try_get_mut_writes_inside_only() {
        let mut buf = Buffer2::new(2, 2, vec![0; 4]);
        if let Some(p) = buf.try_get_mut(1, 0) {
            *p = 7;
        }
        assert!(buf.try_get_mut(5, 5).is_none());
        assert_eq!(buf.pixels(), &[0, 7, 0, 0]);
    }

    #[test]
    fn test_map_keeps_dimensions() {
        let buf = Buffer2::new(2, 1, vec![1.0f32, 2.0]);
        let rgb = buf.map(|&v| [v, v * 2.0, v * 3.0]);
        assert_eq!(rgb.width(), 2);
        assert_eq!(rgb.height(), 1);
        assert_eq!(rgb[(1, 0)], [2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_fill() {
        let mut buf = Buffer2::new(2, 2, vec![1, 2, 3, 4]);
        buf.fill(99);
        assert!(buf.iter().all(|&v| v == 99));
    }
}
