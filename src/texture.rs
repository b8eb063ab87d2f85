use std::sync::Arc;

/// Which sampler a texture wants at draw time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SamplerKind {
    /// Trilinear filtering with wrapping addressing.
    #[default]
    Wrap,
    /// Trilinear filtering clamped to the texture edge (skybox, UI-like maps).
    Clamp,
}

impl SamplerKind {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        match self {
            Self::Wrap => 0,
            Self::Clamp => 1,
        }
    }
}

/// Pre-validated RGBA8 pixel data handed to the core by the asset
/// collaborator; the core never decodes image files itself.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub sampler: SamplerKind,
}

impl TextureData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, sampler: SamplerKind) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels,
            sampler,
        }
    }

    /// A 1x1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, rgba.to_vec(), SamplerKind::Wrap)
    }

    /// The stand-in bound when a draw has no usable material.
    pub fn fallback() -> Self {
        // Magenta, so an unbound material is visible at a glance.
        Self::solid([255, 0, 255, 255])
    }
}

/// Diffuse/normal texture pair referenced by a sub-mesh.
#[derive(Clone, Debug)]
pub struct Material {
    pub diffuse: Option<Arc<TextureData>>,
    pub normal: Option<Arc<TextureData>>,
}

impl Material {
    pub fn diffuse_only(texture: TextureData) -> Self {
        Self {
            diffuse: Some(Arc::new(texture)),
            normal: None,
        }
    }

    pub fn with_normal_map(diffuse: TextureData, normal: TextureData) -> Self {
        Self {
            diffuse: Some(Arc::new(diffuse)),
            normal: Some(Arc::new(normal)),
        }
    }
}

/// GPU-side texture plus the view the bind groups reference.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: SamplerKind,
}

impl GpuTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(data.width * 4),
                rows_per_image: Some(data.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            sampler: data.sampler,
        }
    }
}

/// Creates the fixed sampler set indexed by `SamplerKind`.
pub fn create_samplers(device: &wgpu::Device) -> [wgpu::Sampler; SamplerKind::COUNT] {
    let filtering = |address_mode, label| {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        })
    };
    [
        filtering(wgpu::AddressMode::Repeat, "sampler-wrap"),
        filtering(wgpu::AddressMode::ClampToEdge, "sampler-clamp"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_texture_is_one_pixel() {
        let data = TextureData::solid([10, 20, 30, 255]);
        assert_eq!((data.width, data.height), (1, 1));
        assert_eq!(data.pixels, vec![10, 20, 30, 255]);
    }

    #[test]
    fn sampler_kinds_index_the_fixed_set() {
        assert_eq!(SamplerKind::Wrap.index(), 0);
        assert_eq!(SamplerKind::Clamp.index(), 1);
        assert!(SamplerKind::Clamp.index() < SamplerKind::COUNT);
    }
}
