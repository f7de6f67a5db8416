//! The shared image container
//!
//! `Image` is a copy-on-write handle over a [`PixelBuffer`] plus the
//! metadata that travels with it: pixel format, color table,
//! resolution, composition offset, device-pixel ratio and free-form
//! text annotations.
//!
//! # Sharing model
//!
//! Cloning an `Image` is cheap: both handles reference the same
//! `Arc`-counted cell. Every mutator calls [`Image::detach`] first, so
//! a write through one handle is never visible through another. The
//! refcount is atomic, which makes concurrent detaches from clones held
//! by different threads safe; sharing a single handle across threads
//! for mutation still needs external synchronization, like any `&mut`.
//!
//! # The null image
//!
//! A default-constructed `Image` is the null image: a valid terminal
//! value on which every accessor returns zero/empty and every mutator
//! is a no-op. Fallible operations collapse to it rather than leaving a
//! partially built result behind.

mod access;
mod compare;
mod copy;
mod fill;

pub use fill::InvertMode;

use crate::buffer::{PixelBuffer, ReleaseFn};
use crate::color_table::ColorTable;
use crate::error::Result;
use crate::format::PixelFormat;
use crate::geom::{Point, Rect};
use crate::hooks;
use std::collections::BTreeMap;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::warn;

static NEXT_SERIAL: AtomicU32 = AtomicU32::new(1);

/// Shared cell behind one or more `Image` handles.
#[derive(Debug)]
pub(crate) struct ImageData {
    pub(crate) buffer: PixelBuffer,
    pub(crate) format: PixelFormat,
    pub(crate) color_table: Option<ColorTable>,
    /// Dots per meter, 0 if unknown
    pub(crate) dpm_x: i32,
    pub(crate) dpm_y: i32,
    pub(crate) offset: Point,
    pub(crate) device_pixel_ratio: f64,
    pub(crate) text: BTreeMap<String, String>,
    /// Creation-order serial, unique per cell
    pub(crate) ser_no: u32,
    /// Mutation generation, bumped by every detach
    pub(crate) detach_no: u32,
    /// An external cache tracks this cell; cleanup hooks must run
    /// before its content changes or disappears
    pub(crate) is_cached: AtomicBool,
    /// Stand-in for an active external paint context; blocks mutation
    pub(crate) paint_active: AtomicBool,
}

impl ImageData {
    fn new(buffer: PixelBuffer, format: PixelFormat, color_table: Option<ColorTable>) -> Self {
        Self {
            buffer,
            format,
            color_table,
            dpm_x: 0,
            dpm_y: 0,
            offset: Point::default(),
            device_pixel_ratio: 1.0,
            text: BTreeMap::new(),
            ser_no: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            detach_no: 0,
            is_cached: AtomicBool::new(false),
            paint_active: AtomicBool::new(false),
        }
    }

    #[inline]
    fn cache_key(&self) -> u64 {
        (u64::from(self.ser_no) << 32) | u64::from(self.detach_no)
    }
}

impl Drop for ImageData {
    fn drop(&mut self) {
        if self.is_cached.load(Ordering::Relaxed) {
            hooks::execute_cleanup_hooks(self.cache_key());
        }
    }
}

/// Copy-on-write raster image.
#[derive(Debug, Clone, Default)]
pub struct Image {
    pub(crate) d: Option<Arc<ImageData>>,
}

impl Image {
    /// Create a zero-initialized image.
    ///
    /// Mono formats get the default black/white color table; Indexed8
    /// starts without one.
    ///
    /// # Errors
    ///
    /// Propagates [`PixelBuffer::create`] failures: bad dimensions,
    /// `Invalid` format, size overflow, allocation failure.
    pub fn new(width: i32, height: i32, format: PixelFormat) -> Result<Self> {
        Self::with_color_count(width, height, format, 0)
    }

    /// Create an image with a pre-sized color table of zero entries.
    ///
    /// The requested count is clamped per format: Mono formats always
    /// get the 2-entry default table, Indexed8 at most 256 entries,
    /// direct-color formats none.
    pub fn with_color_count(
        width: i32,
        height: i32,
        format: PixelFormat,
        color_count: usize,
    ) -> Result<Self> {
        let buffer = PixelBuffer::create(width, height, format)?;
        let table = match format {
            PixelFormat::Mono | PixelFormat::MonoLsb => Some(ColorTable::mono()),
            PixelFormat::Indexed8 if color_count > 0 => {
                let mut t = ColorTable::default();
                t.set_color_count(color_count.min(256));
                Some(t)
            }
            PixelFormat::Indexed8 => Some(ColorTable::default()),
            _ => None,
        };
        Ok(Self {
            d: Some(Arc::new(ImageData::new(buffer, format, table))),
        })
    }

    /// Wrap externally owned pixel memory without copying.
    ///
    /// `stride_or_zero <= 0` selects the canonical 4-byte-aligned
    /// stride. With `read_only` set, the first mutation detaches into a
    /// fresh owned copy instead of writing through.
    ///
    /// # Safety
    ///
    /// See [`PixelBuffer::from_raw`]: `ptr` must stay valid and
    /// unaliased for the lifetime of the image and every clone of it.
    pub unsafe fn from_raw(
        ptr: NonNull<u8>,
        width: i32,
        height: i32,
        stride_or_zero: i32,
        format: PixelFormat,
        read_only: bool,
        release: Option<ReleaseFn>,
    ) -> Result<Self> {
        let buffer = unsafe {
            PixelBuffer::from_raw(ptr, width, height, stride_or_zero, format, read_only, release)?
        };
        let table = match format {
            PixelFormat::Mono | PixelFormat::MonoLsb => Some(ColorTable::mono()),
            PixelFormat::Indexed8 => Some(ColorTable::default()),
            _ => None,
        };
        Ok(Self {
            d: Some(Arc::new(ImageData::new(buffer, format, table))),
        })
    }

    /// Build an image around an already-constructed cell.
    pub(crate) fn from_data(data: ImageData) -> Self {
        Self { d: Some(Arc::new(data)) }
    }

    /// The null image.
    pub fn null() -> Self {
        Self::default()
    }

    /// Whether this is the null image.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.d.is_none()
    }

    /// Width in pixels, 0 for the null image.
    #[inline]
    pub fn width(&self) -> i32 {
        self.d.as_ref().map_or(0, |d| d.buffer.width())
    }

    /// Height in pixels, 0 for the null image.
    #[inline]
    pub fn height(&self) -> i32 {
        self.d.as_ref().map_or(0, |d| d.buffer.height())
    }

    /// The enclosing rectangle `(0, 0, width, height)`.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Pixel format, `Invalid` for the null image.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.d.as_ref().map_or(PixelFormat::Invalid, |d| d.format)
    }

    /// Bits per pixel.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.format().depth()
    }

    /// Bytes per line, always a multiple of 4.
    #[inline]
    pub fn stride(&self) -> i32 {
        self.d.as_ref().map_or(0, |d| d.buffer.stride())
    }

    /// Total byte count of the pixel data.
    #[inline]
    pub fn byte_count(&self) -> usize {
        self.d.as_ref().map_or(0, |d| d.buffer.byte_count())
    }

    /// Number of color/alpha bits actually used per pixel.
    #[inline]
    pub fn bit_plane_count(&self) -> u32 {
        self.format().bit_plane_count()
    }

    /// Whether `(x, y)` is a valid pixel coordinate.
    #[inline]
    pub fn valid(&self, x: i32, y: i32) -> bool {
        !self.is_null() && self.rect().contains(x, y)
    }

    /// Read-only view of all pixel bytes; empty for the null image.
    pub fn bits(&self) -> &[u8] {
        self.d.as_ref().map_or(&[], |d| d.buffer.bytes())
    }

    /// One scanline of pixel bytes.
    ///
    /// Returns an empty slice for the null image or a row out of range.
    pub fn scan_line(&self, y: i32) -> &[u8] {
        match &self.d {
            Some(d) if y >= 0 && y < d.buffer.height() => d.buffer.row(y),
            _ => &[],
        }
    }

    /// Mutable view of all pixel bytes. Detaches; `None` if the image
    /// is null (including a null collapse from a failed detach) or
    /// attached to an active paint context.
    pub fn bits_mut(&mut self) -> Option<&mut [u8]> {
        if !self.begin_mutate() {
            return None;
        }
        Arc::get_mut(self.d.as_mut()?).map(|d| d.buffer.bytes_mut())
    }

    /// Mutable view of one scanline. Detaches.
    pub fn scan_line_mut(&mut self, y: i32) -> Option<&mut [u8]> {
        if !self.begin_mutate() {
            return None;
        }
        let d = Arc::get_mut(self.d.as_mut()?)?;
        if y < 0 || y >= d.buffer.height() {
            return None;
        }
        Some(d.buffer.row_mut(y))
    }

    /// The color table, if one is attached.
    pub fn color_table(&self) -> Option<&ColorTable> {
        self.d.as_ref().and_then(|d| d.color_table.as_ref())
    }

    /// Number of color table entries, 0 without a table.
    pub fn color_count(&self) -> usize {
        self.color_table().map_or(0, |t| t.len())
    }

    /// Color table entry `i` as ARGB, 0 when out of range.
    pub fn color(&self, i: usize) -> u32 {
        self.color_table().map_or(0, |t| t.entry(i))
    }

    /// Whether the image can contain non-opaque pixels: either the
    /// format has an alpha channel or the color table has been seen
    /// with a translucent entry.
    pub fn has_alpha_channel(&self) -> bool {
        let Some(d) = &self.d else { return false };
        d.format.has_alpha_channel() || d.color_table.as_ref().is_some_and(|t| t.has_alpha())
    }

    /// Whether every pixel resolves to a gray color. Scans the color
    /// table for indexed formats and the pixels otherwise.
    pub fn is_grayscale(&self) -> bool {
        let Some(d) = &self.d else { return false };
        if d.format.is_indexed() {
            return d.color_table.as_ref().is_some_and(|t| t.is_grayscale());
        }
        match d.format {
            PixelFormat::Rgb32 | PixelFormat::Argb32 | PixelFormat::Argb32Premultiplied => {
                for y in 0..self.height() {
                    for x in 0..self.width() {
                        if !crate::argb::is_gray(self.pixel(x, y)) {
                            return false;
                        }
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Horizontal resolution in dots per meter, 0 if unknown.
    #[inline]
    pub fn dots_per_meter_x(&self) -> i32 {
        self.d.as_ref().map_or(0, |d| d.dpm_x)
    }

    /// Vertical resolution in dots per meter, 0 if unknown.
    #[inline]
    pub fn dots_per_meter_y(&self) -> i32 {
        self.d.as_ref().map_or(0, |d| d.dpm_y)
    }

    /// Intended composition offset.
    #[inline]
    pub fn offset(&self) -> Point {
        self.d.as_ref().map_or(Point::default(), |d| d.offset)
    }

    /// Device pixel ratio, 1.0 by default.
    #[inline]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.d.as_ref().map_or(1.0, |d| d.device_pixel_ratio)
    }

    /// Annotation text stored under `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.d.as_ref()?.text.get(key).map(String::as_str)
    }

    /// All annotation keys, sorted.
    pub fn text_keys(&self) -> Vec<&str> {
        self.d
            .as_ref()
            .map_or_else(Vec::new, |d| d.text.keys().map(String::as_str).collect())
    }

    /// Identity token for caches: `(serial << 32) | detach_counter`.
    /// Changes after every detach; 0 for the null image.
    pub fn cache_key(&self) -> u64 {
        self.d.as_ref().map_or(0, |d| d.cache_key())
    }

    /// Whether no other handle shares this image's data.
    pub fn is_detached(&self) -> bool {
        self.d.as_ref().is_some_and(|d| Arc::strong_count(d) == 1)
    }

    /// Whether two handles share the same underlying cell.
    pub fn shares_data_with(&self, other: &Image) -> bool {
        match (&self.d, &other.d) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Make this handle the unique owner of its data.
    ///
    /// No copy happens when the handle is already unique and writable;
    /// otherwise the cell is deep-copied and this handle rebound to the
    /// copy. An allocation failure during that copy collapses the
    /// handle to the null image. The mutation generation is bumped
    /// whenever the handle is non-null, copied or not, so the cache key
    /// always changes.
    pub fn detach(&mut self) {
        let Some(d) = &self.d else { return };
        if d.is_cached.load(Ordering::Relaxed) && Arc::strong_count(d) == 1 {
            hooks::execute_cleanup_hooks(d.cache_key());
        }
        if Arc::strong_count(d) != 1 || d.buffer.is_read_only() {
            *self = self.copy(Rect::null());
        }
        if let Some(d) = self.d.as_mut().and_then(Arc::get_mut) {
            d.detach_no = d.detach_no.wrapping_add(1);
        }
    }

    /// Detach and verify the image is mutable. False means the caller
    /// must give up: null image, failed detach, or active paint context.
    pub(crate) fn begin_mutate(&mut self) -> bool {
        let Some(d) = &self.d else { return false };
        if d.paint_active.load(Ordering::Relaxed) {
            warn!("image data locked by an active paint context, mutation ignored");
            return false;
        }
        self.detach();
        self.d.is_some()
    }

    /// Mark this image as externally cached: cleanup hooks will run
    /// before its content is next modified and when it is destroyed.
    pub fn mark_cached(&self) {
        if let Some(d) = &self.d {
            d.is_cached.store(true, Ordering::Relaxed);
        }
    }

    /// Flag an active external paint context. Mutators refuse to touch
    /// the pixel data until [`end_paint`](Self::end_paint).
    pub fn begin_paint(&self) {
        if let Some(d) = &self.d {
            d.paint_active.store(true, Ordering::Relaxed);
        }
    }

    /// Clear the active paint context flag.
    pub fn end_paint(&self) {
        if let Some(d) = &self.d {
            d.paint_active.store(false, Ordering::Relaxed);
        }
    }

    /// Replace the color table. Indexed formats only; the call is
    /// ignored with a warning for direct-color formats and tables
    /// larger than the format's index range.
    pub fn set_color_table(&mut self, entries: &[u32]) {
        if self.is_null() {
            return;
        }
        let format = self.format();
        if !format.is_indexed() {
            warn!(?format, "set_color_table: format has no color table");
            return;
        }
        let max = 1usize << format.depth();
        if entries.len() > max {
            warn!(len = entries.len(), max, "set_color_table: too many entries");
            return;
        }
        if !self.begin_mutate() {
            return;
        }
        if let Some(d) = self.d.as_mut().and_then(Arc::get_mut) {
            match &mut d.color_table {
                Some(t) => t.set_table(entries),
                None => d.color_table = Some(ColorTable::new(entries)),
            }
        }
    }

    /// Set one color table entry, growing the table if needed.
    pub fn set_color(&mut self, index: usize, color: u32) {
        if self.is_null() {
            return;
        }
        let format = self.format();
        if !format.is_indexed() {
            warn!(?format, "set_color: format has no color table");
            return;
        }
        if index >= 1usize << format.depth() {
            warn!(index, depth = format.depth(), "set_color: index out of range");
            return;
        }
        if !self.begin_mutate() {
            return;
        }
        if let Some(d) = self.d.as_mut().and_then(Arc::get_mut) {
            d.color_table.get_or_insert_default().set_entry(index, color);
        }
    }

    /// Resize the color table to `count` zero-padded entries.
    ///
    /// Like the underlying [`ColorTable::set_color_count`], truncation
    /// does not clear a previously seen has-alpha flag.
    pub fn set_color_count(&mut self, count: usize) {
        if self.is_null() {
            return;
        }
        let format = self.format();
        if !format.is_indexed() {
            warn!(?format, "set_color_count: format has no color table");
            return;
        }
        let max = 1usize << format.depth();
        if count > max {
            warn!(count, max, "set_color_count: too many entries");
            return;
        }
        if !self.begin_mutate() {
            return;
        }
        if let Some(d) = self.d.as_mut().and_then(Arc::get_mut) {
            d.color_table.get_or_insert_default().set_color_count(count);
        }
    }

    /// Set the horizontal resolution in dots per meter.
    pub fn set_dots_per_meter_x(&mut self, dpm: i32) {
        if self.begin_mutate()
            && let Some(d) = self.d.as_mut().and_then(Arc::get_mut)
        {
            d.dpm_x = dpm;
        }
    }

    /// Set the vertical resolution in dots per meter.
    pub fn set_dots_per_meter_y(&mut self, dpm: i32) {
        if self.begin_mutate()
            && let Some(d) = self.d.as_mut().and_then(Arc::get_mut)
        {
            d.dpm_y = dpm;
        }
    }

    /// Set the intended composition offset.
    pub fn set_offset(&mut self, offset: Point) {
        if self.begin_mutate()
            && let Some(d) = self.d.as_mut().and_then(Arc::get_mut)
        {
            d.offset = offset;
        }
    }

    /// Set the device pixel ratio.
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        if self.begin_mutate()
            && let Some(d) = self.d.as_mut().and_then(Arc::get_mut)
        {
            d.device_pixel_ratio = ratio;
        }
    }

    /// Store annotation text under `key`. An empty value removes the key.
    pub fn set_text(&mut self, key: &str, value: &str) {
        if self.begin_mutate()
            && let Some(d) = self.d.as_mut().and_then(Arc::get_mut)
        {
            if value.is_empty() {
                d.text.remove(key);
            } else {
                d.text.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Force the color table's has-alpha flag on. Transform paths use
    /// this when rotating transparent background into an indexed image.
    pub fn force_alpha_clut(&mut self) {
        if self.begin_mutate()
            && let Some(d) = self.d.as_mut().and_then(Arc::get_mut)
            && let Some(t) = d.color_table.as_mut()
        {
            t.force_has_alpha();
        }
    }

    /// Whether the pixel bytes are borrowed read-only memory; the next
    /// mutation will detach into an owned copy instead of writing
    /// through.
    pub fn is_read_only(&self) -> bool {
        self.d.as_ref().is_some_and(|d| d.buffer.is_read_only())
    }

    /// Reinterpret the pixel bytes as `format` without converting them.
    ///
    /// Only permitted between formats of identical depth and only on a
    /// writable unique cell; in-place conversion paths rewrite the
    /// bytes first and then retag the image with this. Leaving the
    /// indexed family drops the color table; entering the mono family
    /// installs the default one when none is present. Returns false and
    /// leaves the image untouched if the preconditions do not hold.
    pub fn reinterpret_format(&mut self, format: PixelFormat) -> bool {
        let Some(d) = &self.d else { return false };
        if format == PixelFormat::Invalid || format.depth() != d.format.depth() {
            return false;
        }
        if !self.begin_mutate() {
            return false;
        }
        let Some(d) = self.d.as_mut().and_then(Arc::get_mut) else { return false };
        d.format = format;
        if !format.is_indexed() {
            d.color_table = None;
        } else if d.color_table.is_none() {
            d.color_table = Some(match format {
                PixelFormat::Indexed8 => ColorTable::default(),
                _ => ColorTable::mono(),
            });
        }
        true
    }

    /// Copy resolution, device-pixel ratio and text annotations from
    /// another image. Derived-image producers (format conversion,
    /// scaling) use this to keep the metadata travelling.
    pub fn clone_metadata_from(&mut self, src: &Image) {
        let (Some(s), true) = (&src.d, self.begin_mutate()) else { return };
        let dpm = (s.dpm_x, s.dpm_y);
        let dpr = s.device_pixel_ratio;
        let text = s.text.clone();
        if let Some(d) = self.d.as_mut().and_then(Arc::get_mut) {
            d.dpm_x = dpm.0;
            d.dpm_y = dpm.1;
            d.device_pixel_ratio = dpr;
            d.text = text;
        }
    }

    /// Clone the cell's metadata (everything but pixels and identity)
    /// onto another freshly created cell.
    pub(crate) fn copy_metadata_to(&self, dst: &mut ImageData) {
        if let Some(d) = &self.d {
            dst.dpm_x = d.dpm_x;
            dst.dpm_y = d.dpm_y;
            dst.offset = d.offset;
            dst.device_pixel_ratio = d.device_pixel_ratio;
            dst.text = d.text.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argb;

    #[test]
    fn test_null_image_defaults() {
        let img = Image::null();
        assert!(img.is_null());
        assert_eq!(img.width(), 0);
        assert_eq!(img.height(), 0);
        assert_eq!(img.format(), PixelFormat::Invalid);
        assert_eq!(img.stride(), 0);
        assert_eq!(img.byte_count(), 0);
        assert_eq!(img.cache_key(), 0);
        assert!(img.bits().is_empty());
        assert!(img.scan_line(0).is_empty());
        assert!(!img.is_detached());
        assert_eq!(img.color_count(), 0);
        assert!(!img.has_alpha_channel());
    }

    #[test]
    fn test_null_image_mutators_are_noops() {
        let mut img = Image::null();
        img.detach();
        img.set_text("k", "v");
        img.set_dots_per_meter_x(100);
        img.set_color(0, 0xffff_ffff);
        assert!(img.is_null());
    }

    #[test]
    fn test_new_image_basics() {
        let img = Image::new(10, 20, PixelFormat::Argb32).unwrap();
        assert!(!img.is_null());
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 20);
        assert_eq!(img.depth(), 32);
        assert_eq!(img.stride(), 40);
        assert_eq!(img.byte_count(), 800);
        assert!(img.is_detached());
        assert!(img.has_alpha_channel());
        assert!(img.valid(9, 19));
        assert!(!img.valid(10, 0));
    }

    #[test]
    fn test_mono_default_table() {
        let img = Image::new(8, 8, PixelFormat::Mono).unwrap();
        assert_eq!(img.color_count(), 2);
        assert_eq!(img.color(0), 0xff00_0000);
        assert_eq!(img.color(1), 0xffff_ffff);
    }

    #[test]
    fn test_with_color_count_clamps() {
        let img = Image::with_color_count(4, 4, PixelFormat::Indexed8, 300).unwrap();
        assert_eq!(img.color_count(), 256);
        let img = Image::with_color_count(4, 4, PixelFormat::Mono, 300).unwrap();
        assert_eq!(img.color_count(), 2);
        let img = Image::with_color_count(4, 4, PixelFormat::Rgb32, 300).unwrap();
        assert_eq!(img.color_count(), 0);
    }

    #[test]
    fn test_clone_shares_detach_copies() {
        let mut a = Image::new(4, 4, PixelFormat::Argb32).unwrap();
        a.fill(argb::rgb(10, 20, 30));
        let b = a.clone();
        assert!(a.shares_data_with(&b));
        assert!(!a.is_detached());
        assert!(!b.is_detached());

        a.detach();
        assert!(!a.shares_data_with(&b));
        assert!(a.is_detached());
        assert!(b.is_detached());
        assert_eq!(a.pixel(1, 1), b.pixel(1, 1));
    }

    #[test]
    fn test_cache_key_changes_on_detach() {
        let mut img = Image::new(2, 2, PixelFormat::Rgb32).unwrap();
        let k0 = img.cache_key();
        assert_ne!(k0, 0);
        img.detach();
        assert_ne!(img.cache_key(), k0);
    }

    #[test]
    fn test_serial_numbers_unique() {
        let a = Image::new(1, 1, PixelFormat::Rgb32).unwrap();
        let b = Image::new(1, 1, PixelFormat::Rgb32).unwrap();
        assert_ne!(a.cache_key() >> 32, b.cache_key() >> 32);
    }

    #[test]
    fn test_set_color_validation() {
        let mut img = Image::new(4, 4, PixelFormat::Mono).unwrap();
        // Mono indexes are 0..=1
        img.set_color(2, 0xffff_0000);
        assert_eq!(img.color_count(), 2);
        img.set_color(1, 0xffff_0000);
        assert_eq!(img.color(1), 0xffff_0000);

        let mut rgb = Image::new(4, 4, PixelFormat::Rgb32).unwrap();
        rgb.set_color(0, 0xffff_0000);
        assert_eq!(rgb.color_count(), 0);
    }

    #[test]
    fn test_text_annotations() {
        let mut img = Image::new(2, 2, PixelFormat::Rgb32).unwrap();
        img.set_text("author", "someone");
        img.set_text("title", "a test");
        assert_eq!(img.text("author"), Some("someone"));
        assert_eq!(img.text_keys(), vec!["author", "title"]);
        img.set_text("author", "");
        assert_eq!(img.text("author"), None);
    }

    #[test]
    fn test_metadata_setters_detach() {
        let mut a = Image::new(2, 2, PixelFormat::Rgb32).unwrap();
        let b = a.clone();
        a.set_dots_per_meter_x(3000);
        a.set_dots_per_meter_y(1500);
        a.set_offset(Point::new(3, 4));
        assert_eq!(a.dots_per_meter_x(), 3000);
        assert_eq!(a.dots_per_meter_y(), 1500);
        assert_eq!(a.offset(), Point::new(3, 4));
        assert_eq!(b.dots_per_meter_x(), 0);
        assert_eq!(b.offset(), Point::default());
    }

    #[test]
    fn test_paint_active_blocks_mutation() {
        let mut img = Image::new(2, 2, PixelFormat::Rgb32).unwrap();
        img.begin_paint();
        assert!(img.bits_mut().is_none());
        img.end_paint();
        assert!(img.bits_mut().is_some());
    }

    #[test]
    fn test_read_only_external_buffer_detaches_on_write() {
        let mut bytes = [0u8; 16];
        let ptr = NonNull::new(bytes.as_mut_ptr()).unwrap();
        let mut img =
            unsafe { Image::from_raw(ptr, 2, 2, 0, PixelFormat::Argb32, true, None) }.unwrap();
        let key_before = img.cache_key();
        img.set_pixel(0, 0, 0xffaa_bbcc);
        // mutation went into a detached copy, not the external bytes
        assert_eq!(bytes, [0u8; 16]);
        drop(img);
        assert_ne!(key_before, 0);
    }
}
