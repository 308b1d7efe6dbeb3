use sdl2::pixels::PixelFormatEnum;
use sdl2::render::WindowCanvas;
use thiserror::Error;

use chip8vm::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8vm::FrameBuffer;

/// Bytes per pixel of an RGB24 texture
const CHANNELS: usize = 3;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("SDL error: {0}")]
    Sdl(String),
}

fn sdl_error(e: impl ToString) -> DisplayError {
    DisplayError::Sdl(e.to_string())
}

/// # Display
/// The Chip-8 display is composed of 64x32 black/white pixels.
/// The on/off state of these pixels is encoded as 1/0 respectively in a FrameBuffer.
/// The display only gets a call to `render` when the machine reports a new frame.
pub struct Display {
    canvas: WindowCanvas,
}

impl Display {
    /// Opens a window bound to an sdl2 context.
    ///
    /// # Arguments
    /// * `sdl` an sdl2 context with which to draw
    /// * `title` the window title
    /// * `scale` the size multiplier for each pixel
    pub fn new(sdl: &sdl2::Sdl, title: &str, scale: u32) -> Result<Self, DisplayError> {
        let video_subsystem = sdl.video().map_err(sdl_error)?;
        let window = video_subsystem
            .window(
                title,
                DISPLAY_WIDTH as u32 * scale,
                DISPLAY_HEIGHT as u32 * scale,
            )
            .position_centered()
            .opengl()
            .build()
            .map_err(sdl_error)?;
        let canvas = window.into_canvas().build().map_err(sdl_error)?;

        Ok(Display { canvas })
    }

    /// Formats a FrameBuffer as an RGB24 texture: concatenated rows of pixels,
    /// each pixel repeated across all three channels at 0 or 255 intensity.
    fn frame_to_rgb(frame: &FrameBuffer) -> Vec<u8> {
        frame
            .iter()
            .flatten()
            .flat_map(|&px| [px * 255; CHANNELS])
            .collect()
    }

    /// Formats the FrameBuffer as an SDL2 RGB24 texture and presents it.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn render(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let texture_creator = self.canvas.texture_creator();
        let mut texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
            )
            .map_err(sdl_error)?;

        let rgb = Display::frame_to_rgb(frame);
        texture
            .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                for (row, pixels) in rgb.chunks(DISPLAY_WIDTH * CHANNELS).enumerate() {
                    buffer[row * pitch..row * pitch + pixels.len()].copy_from_slice(pixels);
                }
            })
            .map_err(sdl_error)?;

        self.canvas.copy(&texture, None, None).map_err(sdl_error)?;
        self.canvas.present();
        Ok(())
    }
}
