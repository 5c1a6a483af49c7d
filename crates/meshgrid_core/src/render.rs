//! Particle rendering.
//!
//! The engine does not rasterize. It drives a [`Surface`], which the host
//! backs with whatever 2D drawing API it has. [`DrawList`] is a recording
//! surface that keeps the frame as commands plus a flat vertex buffer ready
//! for upload.
//!
//! ```text
//!          top
//!           ◆            half_extent = base_size * particle.size
//!   left ◆  +  ◆ right   alpha       = clamp(particle.opacity, 0, 1)
//!           ◆
//!        bottom
//! ```

use crate::math::Vec2;
use crate::particle::Particle;

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component (0-1).
    pub r: f32,
    /// Green component (0-1).
    pub g: f32,
    /// Blue component (0-1).
    pub b: f32,
    /// Alpha component (0-1).
    pub a: f32,
}

impl Color {
    /// Solid black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Solid white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from RGBA values (0-1).
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from a hex value (0xRRGGBBAA).
    #[must_use]
    pub fn hex(hex: u32) -> Self {
        let channel = |shift: u32| f32::from(((hex >> shift) & 0xFF) as u8) / 255.0;
        Self::rgba(channel(24), channel(16), channel(8), channel(0))
    }

    /// Returns the color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Converts to array format.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A retained 2D drawing target.
pub trait Surface {
    /// Starts a new frame, discarding everything drawn before.
    fn clear(&mut self);

    /// Fills a diamond (a square rotated 45°) centred on `center`.
    fn fill_diamond(&mut self, center: Vec2, half_extent: f32, color: Color);
}

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Filled diamond.
    Diamond {
        /// Centre in canvas space.
        center: Vec2,
        /// Distance from centre to each vertex.
        half_extent: f32,
        /// Fill color, alpha already applied.
        color: Color,
    },
}

/// Vertex of a diamond quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DiamondVertex {
    /// Position (x, y).
    pub position: [f32; 2],
    /// Color (RGBA).
    pub color: [f32; 4],
}

impl DiamondVertex {
    /// Creates a new vertex.
    #[must_use]
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Index pattern of one diamond: two triangles over four vertices.
pub const DIAMOND_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Recording [`Surface`].
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    vertices: Vec<DiamondVertex>,
}

impl DrawList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list pre-sized for `diamonds` diamonds per frame.
    #[must_use]
    pub fn with_capacity(diamonds: usize) -> Self {
        Self {
            commands: Vec::with_capacity(diamonds),
            vertices: Vec::with_capacity(diamonds * 4),
        }
    }

    /// Commands recorded since the last clear.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Vertex data, four per diamond (top, right, bottom, left).
    #[must_use]
    pub fn vertices(&self) -> &[DiamondVertex] {
        &self.vertices
    }

    /// Vertex data as raw bytes for buffer upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Triangle indices matching [`Self::vertices`].
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        #[allow(clippy::cast_possible_truncation)]
        (0..self.commands.len() as u32)
            .flat_map(|diamond| DIAMOND_INDICES.map(|i| diamond * 4 + i))
            .collect()
    }

    /// Number of diamonds recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing has been drawn this frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Surface for DrawList {
    fn clear(&mut self) {
        self.commands.clear();
        self.vertices.clear();
    }

    fn fill_diamond(&mut self, center: Vec2, half_extent: f32, color: Color) {
        self.commands.push(DrawCommand::Diamond {
            center,
            half_extent,
            color,
        });
        let rgba = color.to_array();
        let Vec2 { x, y } = center;
        self.vertices.extend([
            DiamondVertex::new(x, y - half_extent, rgba),
            DiamondVertex::new(x + half_extent, y, rgba),
            DiamondVertex::new(x, y + half_extent, rgba),
            DiamondVertex::new(x - half_extent, y, rgba),
        ]);
    }
}

/// Clears `surface` and draws one diamond per particle.
pub fn render_particles<S>(surface: &mut S, particles: &[Particle], base_size: f32, color: Color)
where
    S: Surface + ?Sized,
{
    surface.clear();
    for particle in particles {
        let alpha = particle.opacity.clamp(0.0, 1.0);
        let half_extent = (base_size * particle.size).max(0.0);
        surface.fill_diamond(particle.position(), half_extent, color.with_alpha(color.a * alpha));
    }
}
