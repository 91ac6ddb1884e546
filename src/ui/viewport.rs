//! State of the viewport panel that shows the off-screen framebuffer

/// Where row 0 of a render target sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOrigin {
    /// Row 0 is the top row (wgpu)
    TopLeft,
    /// Row 0 is the bottom row (OpenGL style targets)
    BottomLeft,
}

impl TextureOrigin {
    /// `(uv0, uv1)` that show the target upright in an image widget
    pub fn uv_bounds(self) -> ([f32; 2], [f32; 2]) {
        match self {
            TextureOrigin::TopLeft => ([0.0, 0.0], [1.0, 1.0]),
            TextureOrigin::BottomLeft => ([0.0, 1.0], [1.0, 0.0]),
        }
    }
}

/// What the viewport panel measured during the last UI frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Content region in pixels
    pub size: [f32; 2],
    /// Screen position of the content region's top-left corner
    pub position: [f32; 2],
    pub hovered: bool,
    pub focused: bool,
}

impl ViewportState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: [width as f32, height as f32],
            position: [0.0, 0.0],
            hovered: false,
            focused: false,
        }
    }

    /// Records a newly measured content region
    ///
    /// Returns the framebuffer size to switch to when the region changed and is
    /// positive in both dimensions.
    pub fn measure(&mut self, available: [f32; 2]) -> Option<(u32, u32)> {
        if available == self.size {
            return None;
        }
        let width = available[0].floor();
        let height = available[1].floor();
        if width < 1.0 || height < 1.0 {
            return None;
        }

        self.size = available;
        Some((width as u32, height as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_flip_depends_on_origin() {
        assert_eq!(TextureOrigin::TopLeft.uv_bounds(), ([0.0, 0.0], [1.0, 1.0]));
        assert_eq!(TextureOrigin::BottomLeft.uv_bounds(), ([0.0, 1.0], [1.0, 0.0]));
    }

    #[test]
    fn test_measure_reports_changes_only() {
        let mut viewport = ViewportState::new(1280, 720);
        assert_eq!(viewport.measure([1280.0, 720.0]), None);
        assert_eq!(viewport.measure([800.0, 600.5]), Some((800, 600)));
        assert_eq!(viewport.measure([800.0, 600.5]), None);
    }

    #[test]
    fn test_collapsed_region_is_ignored() {
        let mut viewport = ViewportState::new(1280, 720);
        assert_eq!(viewport.measure([0.0, 720.0]), None);
        assert_eq!(viewport.measure([640.0, 0.4]), None);
        assert_eq!(viewport.size, [1280.0, 720.0]);
    }
}
