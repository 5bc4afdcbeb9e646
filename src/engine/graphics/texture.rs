use std::path::Path;

use image::{GrayImage, RgbaImage};
use log::debug;
use wgpu;

use crate::error::{GameError, Result};

pub struct Texture {
    pub texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Reads an image and, when given, a second grayscale image whose luma becomes
/// the alpha channel. Runs without a GPU so it can be done on worker threads.
pub fn decode(image_path: &Path, alpha_path: Option<&Path>) -> Result<RgbaImage> {
    let mut rgba = open(image_path)?.to_rgba8();
    if let Some(alpha_path) = alpha_path {
        let alpha = open(alpha_path)?.to_luma8();
        merge_alpha(&mut rgba, &alpha, alpha_path)?;
    }
    debug!(
        "Decoded texture {} ({}x{})",
        image_path.display(),
        rgba.width(),
        rgba.height()
    );
    Ok(rgba)
}

fn open(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).map_err(|source| GameError::Texture {
        path: path.to_path_buf(),
        source,
    })
}

pub fn merge_alpha(rgba: &mut RgbaImage, alpha: &GrayImage, alpha_path: &Path) -> Result<()> {
    if rgba.dimensions() != alpha.dimensions() {
        return Err(GameError::AlphaMismatch {
            alpha: alpha_path.to_path_buf(),
            expected: rgba.dimensions(),
            found: alpha.dimensions(),
        });
    }
    for (pixel, a) in rgba.pixels_mut().zip(alpha.pixels()) {
        pixel.0[3] = a.0[0];
    }
    Ok(())
}

/// 2x2 red/green/blue/white pattern that stands in for textures that failed to load.
pub fn checkerboard() -> RgbaImage {
    RgbaImage::from_raw(
        2,
        2,
        vec![
            255, 0, 0, 255, 0, 255, 0, 255, // Red, Green
            0, 0, 255, 255, 255, 255, 255, 255, // Blue, White
        ],
    )
    .unwrap_or_else(|| RgbaImage::new(2, 2))
}

impl Texture {
    /// Layout shared by every texture bind group: a 2D view and a sampler.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                // Texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        rgba: &RgbaImage,
        label: &str,
    ) -> Self {
        let dimensions = rgba.dimensions();
        let texture_size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some(label),
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            texture_size,
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture_sampler),
                },
            ],
        });

        Self {
            texture,
            bind_group,
        }
    }

    pub fn create_default(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self::from_image(device, queue, layout, &checkerboard(), "Default Texture")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn test_merge_alpha_copies_luma() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let mut alpha = GrayImage::new(2, 1);
        alpha.put_pixel(0, 0, Luma([0]));
        alpha.put_pixel(1, 0, Luma([200]));

        merge_alpha(&mut rgba, &alpha, Path::new("a_fa.bmp")).unwrap();

        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 0]);
        assert_eq!(rgba.get_pixel(1, 0).0, [10, 20, 30, 200]);
    }

    #[test]
    fn test_merge_alpha_size_mismatch() {
        let mut rgba = RgbaImage::new(4, 4);
        let alpha = GrayImage::new(2, 2);
        let err = merge_alpha(&mut rgba, &alpha, Path::new("a_fa.bmp")).unwrap_err();
        assert!(matches!(
            err,
            GameError::AlphaMismatch { expected: (4, 4), found: (2, 2), .. }
        ));
    }

    #[test]
    fn test_missing_file_is_texture_error() {
        let err = decode(Path::new("does/not/exist.bmp"), None).unwrap_err();
        assert!(matches!(err, GameError::Texture { .. }));
    }

    #[test]
    fn test_checkerboard() {
        let img = checkerboard();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }
}
