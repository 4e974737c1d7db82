//! Sizing of the emulator's output container relative to the viewport.
//!
//! DOSBox renders at its own native resolution (320x200, 640x400, ...) and the
//! browser scales the canvas to whatever size its container has. Every mode here
//! is a pure function of the native size and the viewport size.
use crate::host::{HostError, Page};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    fn scaled(self, multiplier: u32) -> Self {
        Size::new(
            self.width.saturating_mul(multiplier),
            self.height.saturating_mul(multiplier),
        )
    }

    fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `640x400`.
impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got \"{}\"", s))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| format!("bad dimension \"{}\": {}", part, e))
        };
        Ok(Size::new(parse(width)?, parse(height)?))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScaleMode {
    /// Largest integer multiple of the native resolution that fits the viewport.
    /// Never goes below 1x, so tiny viewports overflow.
    #[default]
    ContainInteger,
    Native,
    /// Twice the native resolution. May overflow the viewport.
    Double,
    /// Thrice the native resolution. May overflow the viewport.
    Triple,
    /// The full viewport, ignoring the native aspect ratio.
    Stretch,
    /// The largest size that fits the viewport while keeping the native aspect ratio.
    Contain,
}

impl ScaleMode {
    pub fn fit(self, native: Size, viewport: Size) -> Size {
        match self {
            ScaleMode::ContainInteger => fit_integer_contain(native, viewport),
            ScaleMode::Native => native,
            ScaleMode::Double => native.scaled(2),
            ScaleMode::Triple => native.scaled(3),
            ScaleMode::Stretch => viewport,
            ScaleMode::Contain => fit_contain(native, viewport),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleMode::ContainInteger => "contain_integer",
            ScaleMode::Native => "native",
            ScaleMode::Double => "double",
            ScaleMode::Triple => "triple",
            ScaleMode::Stretch => "stretch",
            ScaleMode::Contain => "contain",
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scaling mode \"{0}\"")]
pub struct UnknownScaleMode(pub String);

impl FromStr for ScaleMode {
    type Err = UnknownScaleMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contain_integer" => Ok(ScaleMode::ContainInteger),
            "native" => Ok(ScaleMode::Native),
            "double" => Ok(ScaleMode::Double),
            "triple" => Ok(ScaleMode::Triple),
            "stretch" => Ok(ScaleMode::Stretch),
            "contain" => Ok(ScaleMode::Contain),
            other => Err(UnknownScaleMode(other.to_string())),
        }
    }
}

pub fn fit_integer_contain(native: Size, viewport: Size) -> Size {
    if native.is_empty() {
        return native;
    }
    let width_ratio = (viewport.width / native.width).max(1);
    let height_ratio = (viewport.height / native.height).max(1);
    native.scaled(width_ratio.min(height_ratio))
}

fn fit_contain(native: Size, viewport: Size) -> Size {
    if native.is_empty() {
        return native;
    }
    let (w, h) = (u64::from(native.width), u64::from(native.height));
    let (vw, vh) = (u64::from(viewport.width), u64::from(viewport.height));
    // vw/w <= vh/h means the width is the limiting side.
    if vw * h <= vh * w {
        Size::new(viewport.width, (h * vw / w) as u32)
    } else {
        Size::new((w * vh / h) as u32, viewport.height)
    }
}

/// Resizes the page's container to the fit `mode` gives for the current sizes.
pub fn rescale<P: Page + ?Sized>(page: &P, mode: ScaleMode) -> Result<Size, HostError> {
    let size = mode.fit(page.native_size(), page.viewport_size());
    page.set_container_size(size)?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockPage;

    #[test]
    fn contain_integer_picks_largest_multiple() {
        let fit = fit_integer_contain(Size::new(320, 200), Size::new(1000, 700));
        assert_eq!(fit, Size::new(960, 600));
    }

    #[test]
    fn contain_integer_limited_by_narrower_side() {
        // 1920/640 = 3 but 1000/400 = 2
        let fit = fit_integer_contain(Size::new(640, 400), Size::new(1920, 1000));
        assert_eq!(fit, Size::new(1280, 800));
    }

    #[test]
    fn contain_integer_never_below_native() {
        let fit = fit_integer_contain(Size::new(320, 200), Size::new(300, 150));
        assert_eq!(fit, Size::new(320, 200));
    }

    #[test]
    fn contain_integer_exact_fit() {
        let fit = fit_integer_contain(Size::new(320, 200), Size::new(640, 400));
        assert_eq!(fit, Size::new(640, 400));
    }

    #[test]
    fn contain_integer_never_exceeds_larger_viewport() {
        for &(w, h) in &[(320, 200), (640, 480), (720, 400), (640, 350)] {
            for vw in (w..w * 5).step_by(37) {
                for vh in (h..h * 5).step_by(41) {
                    let fit = fit_integer_contain(Size::new(w, h), Size::new(vw, vh));
                    let multiplier = fit.width / w;
                    assert!(multiplier >= 1);
                    assert_eq!(fit, Size::new(w * multiplier, h * multiplier));
                    assert!(fit.width <= vw && fit.height <= vh);
                    // the next multiple up would not fit
                    assert!(w * (multiplier + 1) > vw || h * (multiplier + 1) > vh);
                }
            }
        }
    }

    #[test]
    fn zero_native_size_is_left_alone() {
        let fit = fit_integer_contain(Size::new(0, 200), Size::new(1000, 700));
        assert_eq!(fit, Size::new(0, 200));
        assert_eq!(
            ScaleMode::Contain.fit(Size::new(320, 0), Size::new(1000, 700)),
            Size::new(320, 0)
        );
    }

    #[test]
    fn fixed_multiples_ignore_viewport() {
        let native = Size::new(320, 200);
        let tiny = Size::new(10, 10);
        assert_eq!(ScaleMode::Native.fit(native, tiny), native);
        assert_eq!(ScaleMode::Double.fit(native, tiny), Size::new(640, 400));
        assert_eq!(ScaleMode::Triple.fit(native, tiny), Size::new(960, 600));
    }

    #[test]
    fn stretch_fills_viewport() {
        let fit = ScaleMode::Stretch.fit(Size::new(320, 200), Size::new(1234, 567));
        assert_eq!(fit, Size::new(1234, 567));
    }

    #[test]
    fn contain_keeps_aspect() {
        // width limited
        assert_eq!(
            ScaleMode::Contain.fit(Size::new(320, 200), Size::new(1000, 1000)),
            Size::new(1000, 625)
        );
        // height limited
        assert_eq!(
            ScaleMode::Contain.fit(Size::new(320, 200), Size::new(1000, 500)),
            Size::new(800, 500)
        );
    }

    #[test]
    fn mode_names_parse_back() {
        for mode in [
            ScaleMode::ContainInteger,
            ScaleMode::Native,
            ScaleMode::Double,
            ScaleMode::Triple,
            ScaleMode::Stretch,
            ScaleMode::Contain,
        ] {
            assert_eq!(mode.name().parse::<ScaleMode>(), Ok(mode));
        }
        assert_eq!(
            "huge".parse::<ScaleMode>(),
            Err(UnknownScaleMode("huge".to_string()))
        );
    }

    #[test]
    fn size_parses_from_text() {
        assert_eq!("640x400".parse::<Size>(), Ok(Size::new(640, 400)));
        assert_eq!("1920X1080".parse::<Size>(), Ok(Size::new(1920, 1080)));
        assert!("640".parse::<Size>().is_err());
        assert!("ax400".parse::<Size>().is_err());
    }

    #[test]
    fn rescale_resizes_container() {
        let page = MockPage::new(Size::new(1000, 700), Size::new(320, 200));
        let size = rescale(&page, ScaleMode::ContainInteger).unwrap();
        assert_eq!(size, Size::new(960, 600));
        assert_eq!(page.container_size(), Some(Size::new(960, 600)));
    }
}
