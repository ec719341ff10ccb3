//! Compositing operators.
//!
//! All colors are premultiplied `[r, g, b, a]` with channels in `0..=1`.

/// A premultiplied RGBA color
pub type Pixel = [f32; 4];

pub const TRANSPARENT: Pixel = [0.; 4];

/// Describes how the source is combined with the destination
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operator {
    /// Clear the destination
    Clear,

    /// Replace the destination
    Source,

    /// Draw the source on top of the destination
    #[default]
    Over,

    /// Draw the source where there was destination content
    In,

    /// Draw the source where there was no destination content
    Out,

    /// Draw the source on top of the destination, only where there was destination content
    Atop,

    /// Leave the destination untouched
    Dest,
    DestOver,
    DestIn,
    DestOut,
    DestAtop,
    Xor,

    /// Add the source and destination
    Add,

    /// Like [Operator::Over], but assuming the source and destination are disjoint geometries
    Saturate,

    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,

    /// Hue of the source, saturation and luminosity of the destination
    HslHue,

    /// Saturation of the source, hue and luminosity of the destination
    HslSaturation,

    /// Hue and saturation of the source, luminosity of the destination
    HslColor,

    /// Luminosity of the source, hue and saturation of the destination
    HslLuminosity,
}

impl Operator {
    /// Unbounded operators modify the destination even where the source is transparent,
    /// so they need to be applied to the whole clip region instead of just the area
    /// covered by the shape
    #[must_use]
    pub fn is_unbounded(self) -> bool {
        matches!(self, Self::In | Self::Out | Self::DestIn | Self::DestAtop)
    }

    /// Combine a source pixel with a destination pixel.
    ///
    /// `mask` is the coverage of the shape being drawn, `clip` the coverage of
    /// the clip region. [Operator::Clear] and [Operator::Source] are bounded by
    /// the mask, all other operators blend the masked source with the destination.
    #[must_use]
    pub fn composite(self, source: Pixel, destination: Pixel, mask: f32, clip: f32) -> Pixel {
        match self {
            Self::Clear => lerp(destination, TRANSPARENT, mask * clip),
            Self::Source => lerp(destination, source, mask * clip),
            _ => {
                let source = source.map(|channel| channel * mask);
                lerp(destination, self.blend(source, destination), clip)
            },
        }
    }

    /// Combine two pixels with full coverage
    #[must_use]
    pub fn blend(self, source: Pixel, destination: Pixel) -> Pixel {
        let sa = source[3];
        let da = destination[3];

        let porter_duff = |fa: f32, fb: f32| -> Pixel {
            std::array::from_fn(|i| (source[i] * fa + destination[i] * fb).min(1.))
        };

        match self {
            Self::Clear => TRANSPARENT,
            Self::Source => source,
            Self::Over => porter_duff(1., 1. - sa),
            Self::In => porter_duff(da, 0.),
            Self::Out => porter_duff(1. - da, 0.),
            Self::Atop => porter_duff(da, 1. - sa),
            Self::Dest => destination,
            Self::DestOver => porter_duff(1. - da, 1.),
            Self::DestIn => porter_duff(0., sa),
            Self::DestOut => porter_duff(0., 1. - sa),
            Self::DestAtop => porter_duff(1. - da, sa),
            Self::Xor => porter_duff(1. - da, 1. - sa),
            Self::Add => porter_duff(1., 1.),
            Self::Saturate => {
                let fa = if sa > 0. { ((1. - da) / sa).min(1.) } else { 1. };
                porter_duff(fa, 1.)
            },
            Self::Multiply => separable(source, destination, |s, d| s * d),
            Self::Screen => separable(source, destination, screen),
            Self::Overlay => separable(source, destination, |s, d| hard_light(d, s)),
            Self::Darken => separable(source, destination, f32::min),
            Self::Lighten => separable(source, destination, f32::max),
            Self::ColorDodge => separable(source, destination, color_dodge),
            Self::ColorBurn => separable(source, destination, color_burn),
            Self::HardLight => separable(source, destination, hard_light),
            Self::SoftLight => separable(source, destination, soft_light),
            Self::Difference => separable(source, destination, |s, d| (s - d).abs()),
            Self::Exclusion => separable(source, destination, |s, d| s + d - 2. * s * d),
            Self::HslHue => non_separable(source, destination, |s, d| {
                set_luminosity(set_saturation(s, saturation(d)), luminosity(d))
            }),
            Self::HslSaturation => non_separable(source, destination, |s, d| {
                set_luminosity(set_saturation(d, saturation(s)), luminosity(d))
            }),
            Self::HslColor => {
                non_separable(source, destination, |s, d| set_luminosity(s, luminosity(d)))
            },
            Self::HslLuminosity => {
                non_separable(source, destination, |s, d| set_luminosity(d, luminosity(s)))
            },
        }
    }
}

fn lerp(from: Pixel, to: Pixel, t: f32) -> Pixel {
    if t >= 1. {
        return to;
    }
    if t <= 0. {
        return from;
    }
    std::array::from_fn(|i| from[i] + (to[i] - from[i]) * t)
}

fn unpremultiply(pixel: Pixel) -> [f32; 3] {
    let alpha = pixel[3];
    if alpha <= 0. {
        return [0.; 3];
    }
    [
        (pixel[0] / alpha).min(1.),
        (pixel[1] / alpha).min(1.),
        (pixel[2] / alpha).min(1.),
    ]
}

/// `result = (1 - da) * s + (1 - sa) * d + sa * da * B(cs, cd)`
fn blend_with(source: Pixel, destination: Pixel, blended: [f32; 3]) -> Pixel {
    let sa = source[3];
    let da = destination[3];

    let mut result = [0.; 4];
    for i in 0..3 {
        result[i] =
            ((1. - da) * source[i] + (1. - sa) * destination[i] + sa * da * blended[i]).clamp(0., 1.);
    }
    result[3] = (sa + da - sa * da).clamp(0., 1.);
    result
}

fn separable<F: Fn(f32, f32) -> f32>(source: Pixel, destination: Pixel, blend: F) -> Pixel {
    let cs = unpremultiply(source);
    let cd = unpremultiply(destination);
    let blended = std::array::from_fn(|i| blend(cs[i], cd[i]));
    blend_with(source, destination, blended)
}

fn non_separable<F: Fn([f32; 3], [f32; 3]) -> [f32; 3]>(
    source: Pixel,
    destination: Pixel,
    blend: F,
) -> Pixel {
    let blended = blend(unpremultiply(source), unpremultiply(destination));
    blend_with(source, destination, blended)
}

fn screen(s: f32, d: f32) -> f32 {
    s + d - s * d
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        d * 2. * s
    } else {
        screen(d, 2. * s - 1.)
    }
}

fn color_dodge(s: f32, d: f32) -> f32 {
    if d == 0. {
        0.
    } else if s >= 1. {
        1.
    } else {
        (d / (1. - s)).min(1.)
    }
}

fn color_burn(s: f32, d: f32) -> f32 {
    if d >= 1. {
        1.
    } else if s <= 0. {
        0.
    } else {
        1. - ((1. - d) / s).min(1.)
    }
}

fn soft_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        d - (1. - 2. * s) * d * (1. - d)
    } else {
        let f = if d <= 0.25 {
            ((16. * d - 12.) * d + 4.) * d
        } else {
            d.sqrt()
        };
        d + (2. * s - 1.) * (f - d)
    }
}

fn luminosity(color: [f32; 3]) -> f32 {
    0.3 * color[0] + 0.59 * color[1] + 0.11 * color[2]
}

fn saturation(color: [f32; 3]) -> f32 {
    color[0].max(color[1]).max(color[2]) - color[0].min(color[1]).min(color[2])
}

/// Move the color back into gamut while keeping its luminosity
fn clip_color(color: [f32; 3]) -> [f32; 3] {
    let l = luminosity(color);
    let n = color[0].min(color[1]).min(color[2]);
    let x = color[0].max(color[1]).max(color[2]);

    color.map(|c| {
        let mut c = c;
        if n < 0. && l - n != 0. {
            c = l + (c - l) * l / (l - n);
        }
        if x > 1. && x - l != 0. {
            c = l + (c - l) * (1. - l) / (x - l);
        }
        c
    })
}

fn set_luminosity(color: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - luminosity(color);
    clip_color(color.map(|c| c + d))
}

fn set_saturation(color: [f32; 3], s: f32) -> [f32; 3] {
    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| color[a].total_cmp(&color[b]));
    let [min, mid, max] = order;

    let mut result = [0.; 3];
    if color[max] > color[min] {
        result[mid] = (color[mid] - color[min]) * s / (color[max] - color[min]);
        result[max] = s;
    }
    result
}
