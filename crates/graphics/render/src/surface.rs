//! Pixel storage that can be drawn to and read from

use std::{
    cell::{Ref, RefCell, RefMut},
    io,
    rc::Rc,
};

use math::{AffineTransform, Vec2D};

use crate::{error::Status, operator::Pixel, Error, Result};

/// Surfaces larger than this in either dimension can not be created
pub const MAX_SIZE: usize = 32767;

/// How pixels are stored in memory.
///
/// Every pixel occupies one `u32`, in the layout `0xAARRGGBB` with
/// premultiplied color channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// Only an alpha channel, color is ignored
    A8,

    /// Color without alpha, the alpha bits are ignored and treated as opaque
    Rgb24,

    #[default]
    Argb32,
}

impl Format {
    /// Number of bytes per pixel in data passed to [Surface::from_data]
    #[must_use]
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::A8 => 1,
            Self::Rgb24 | Self::Argb32 => 4,
        }
    }

    fn pack(&self, pixel: Pixel) -> u32 {
        let quantize = |value: f32| (value.clamp(0., 1.) * 255. + 0.5) as u32;
        let [r, g, b, a] = pixel.map(quantize);
        match self {
            Self::A8 => a << 24,
            Self::Rgb24 => 0xFF00_0000 | r << 16 | g << 8 | b,
            Self::Argb32 => a << 24 | r << 16 | g << 8 | b,
        }
    }

    fn unpack(&self, value: u32) -> Pixel {
        let channel = |shift: u32| ((value >> shift) & 0xFF) as f32 / 255.;
        match self {
            Self::A8 => [0., 0., 0., channel(24)],
            Self::Rgb24 => [channel(16), channel(8), channel(0), 1.],
            Self::Argb32 => [channel(16), channel(8), channel(0), channel(24)],
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SurfaceData {
    format: Format,
    width: usize,
    height: usize,

    /// Shared with snapshots, cloned on the first write after a snapshot was taken
    pixels: Rc<Vec<u32>>,
    device_offset: Vec2D,
    device_scale: Vec2D,
    status: Status,
    is_finished: bool,
}

impl SurfaceData {
    fn with_error(format: Format, error: Error) -> Self {
        let mut status = Status::default();
        status.set(error);
        Self {
            format,
            width: 0,
            height: 0,
            pixels: Rc::default(),
            device_offset: Vec2D::new(0., 0.),
            device_scale: Vec2D::new(1., 1.),
            status,
            is_finished: false,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub(crate) fn height(&self) -> usize {
        self.height
    }

    /// Mutable access to the pixels, detaching them from all snapshots
    pub(crate) fn pixels_mut(&mut self) -> PixelsMut<'_> {
        PixelsMut {
            format: self.format,
            width: self.width,
            pixels: Rc::make_mut(&mut self.pixels),
        }
    }
}

/// Write access to the pixels of a surface, for the duration of a single operation
pub(crate) struct PixelsMut<'a> {
    format: Format,
    width: usize,
    pixels: &'a mut Vec<u32>,
}

impl<'a> PixelsMut<'a> {
    #[must_use]
    pub(crate) fn get(&self, x: usize, y: usize) -> Pixel {
        self.format.unpack(self.pixels[y * self.width + x])
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, pixel: Pixel) {
        self.pixels[y * self.width + x] = self.format.pack(pixel);
    }
}

/// A shared handle to a pixel buffer.
///
/// Cloning the handle does not copy the pixels, both handles refer to the
/// same surface.
#[derive(Clone, Debug)]
pub struct Surface(Rc<RefCell<SurfaceData>>);

impl Surface {
    /// Create a transparent surface.
    ///
    /// If the surface can not be created, the returned surface is in an
    /// error state, see [Surface::status].
    #[must_use]
    pub fn new(format: Format, width: usize, height: usize) -> Self {
        let data = match Self::allocate(width, height) {
            Ok(pixels) => SurfaceData {
                format,
                width,
                height,
                pixels: Rc::new(pixels),
                device_offset: Vec2D::new(0., 0.),
                device_scale: Vec2D::new(1., 1.),
                status: Status::default(),
                is_finished: false,
            },
            Err(error) => SurfaceData::with_error(format, error),
        };

        Self(Rc::new(RefCell::new(data)))
    }

    /// Create a surface from existing pixel data.
    ///
    /// `data` contains one byte per pixel for [Format::A8] and four bytes
    /// (a little endian `0xAARRGGBB` value) per pixel otherwise, rows are
    /// tightly packed.
    #[must_use]
    pub fn from_data(format: Format, width: usize, height: usize, data: &[u8]) -> Self {
        let surface = Self::new(format, width, height);
        if surface.status().is_err() {
            return surface;
        }

        let needed = width * height * format.bytes_per_pixel();
        if data.len() < needed {
            log::warn!(
                "Pixel data too short: need {needed} bytes for a {width}x{height} surface, got {}",
                data.len()
            );
            return Self(Rc::new(RefCell::new(SurfaceData::with_error(
                format,
                Error::ReadError,
            ))));
        }

        {
            let mut inner = surface.0.borrow_mut();
            let pixels = inner.pixels_mut();
            let values = data[..needed].chunks_exact(format.bytes_per_pixel());
            for (index, bytes) in values.enumerate() {
                let value = match format {
                    Format::A8 => u32::from(bytes[0]) << 24,
                    Format::Rgb24 | Format::Argb32 => {
                        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
                    },
                };

                // Round-trip through the format to normalize the value
                pixels.pixels[index] = format.pack(format.unpack(value));
            }
        }

        surface
    }

    fn allocate(width: usize, height: usize) -> Result<Vec<u32>> {
        if width > MAX_SIZE || height > MAX_SIZE {
            log::warn!("Refusing to create a surface of size {width}x{height}");
            return Err(Error::InvalidSize);
        }

        let len = width * height;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| Error::NoMemory)?;
        pixels.resize(len, 0);
        Ok(pixels)
    }

    pub(crate) fn data(&self) -> Ref<'_, SurfaceData> {
        self.0.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, SurfaceData> {
        self.0.borrow_mut()
    }

    pub fn status(&self) -> Result<()> {
        self.data().status.get()
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.data().format
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.data().width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.data().height
    }

    /// Return `true` if both handles refer to the same surface
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Set an offset that is added to all coordinates when drawing to the surface
    /// or when using it as a source
    pub fn set_device_offset(&self, x: f64, y: f64) {
        self.data_mut().device_offset = Vec2D::new(x, y);
    }

    #[must_use]
    pub fn device_offset(&self) -> Vec2D {
        self.data().device_offset
    }

    /// Set a scale factor that is applied to all coordinates when drawing to the
    /// surface or when using it as a source.
    ///
    /// Scale factors of zero (or non-finite ones) are ignored.
    pub fn set_device_scale(&self, x_scale: f64, y_scale: f64) {
        if x_scale == 0. || y_scale == 0. || !x_scale.is_finite() || !y_scale.is_finite() {
            log::warn!("Ignoring invalid device scale {x_scale}x{y_scale}");
            return;
        }
        self.data_mut().device_scale = Vec2D::new(x_scale, y_scale);
    }

    #[must_use]
    pub fn device_scale(&self) -> Vec2D {
        self.data().device_scale
    }

    /// The transform from the surface's user space to its pixels
    #[must_use]
    pub fn device_transform(&self) -> AffineTransform {
        let data = self.data();
        AffineTransform::scale(data.device_scale.x, data.device_scale.y)
            .chain(AffineTransform::translate(data.device_offset))
    }

    /// The pixel at `(x, y)` as a premultiplied `0xAARRGGBB` value
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        let data = self.data();
        if x >= data.width || y >= data.height {
            return None;
        }
        data.pixels.get(y * data.width + x).copied()
    }

    /// Complete any pending drawing operations.
    ///
    /// Drawing is never deferred, so this only reports the status.
    pub fn flush(&self) -> Result<()> {
        self.status()
    }

    /// Mark the surface as finished, after which it can not be drawn to anymore.
    ///
    /// The pixels stay readable. Finishing a surface more than once has no effect.
    pub fn finish(&self) {
        let mut data = self.data_mut();
        if !data.is_finished {
            log::debug!("Finishing {}x{} surface", data.width, data.height);
            data.is_finished = true;
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.data().is_finished
    }

    /// An immutable view of the current contents of the surface.
    ///
    /// Taking a snapshot is cheap, the pixels are only copied once the surface is
    /// modified while the snapshot is still alive.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let transform = self.device_transform();
        let data = self.data();
        Snapshot {
            format: data.format,
            width: data.width,
            height: data.height,
            pixels: Rc::clone(&data.pixels),
            device_transform: transform,
        }
    }

    /// Write the surface as a binary PPM image.
    ///
    /// The color channels are written as they are stored, which is the same as
    /// compositing the surface over black.
    pub fn write_ppm<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        let data = self.data();
        write!(writer, "P6\n{} {}\n255\n", data.width, data.height)?;

        let mut bytes = Vec::with_capacity(data.pixels.len() * 3);
        for &value in data.pixels.iter() {
            let [a, r, g, b] = value.to_be_bytes();
            match data.format {
                Format::A8 => bytes.extend_from_slice(&[a, a, a]),
                Format::Rgb24 | Format::Argb32 => bytes.extend_from_slice(&[r, g, b]),
            }
        }
        writer.write_all(&bytes)
    }
}

/// The contents of a [Surface] at a fixed point in time
#[derive(Clone, Debug)]
pub struct Snapshot {
    format: Format,
    width: usize,
    height: usize,
    pixels: Rc<Vec<u32>>,
    device_transform: AffineTransform,
}

impl Snapshot {
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Maps the surface's user space to pixel coordinates
    #[inline]
    #[must_use]
    pub fn device_transform(&self) -> AffineTransform {
        self.device_transform
    }

    /// The premultiplied color at `(x, y)`, transparent outside of the snapshot
    #[must_use]
    pub fn pixel_at(&self, x: usize, y: usize) -> Pixel {
        if x >= self.width || y >= self.height {
            return [0.; 4];
        }
        self.format.unpack(self.pixels[y * self.width + x])
    }
}
