use image::RgbaImage;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A sampled RGBA texture whose contents (and size) can change at runtime.
pub struct DynamicTexture {
    label: &'static str,
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl DynamicTexture {
    pub fn new(device: &wgpu::Device, label: &'static str, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            label,
            texture,
            view,
            width,
            height,
        }
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &'static str,
        image: &RgbaImage,
    ) -> Self {
        let texture = Self::new(device, label, image.width(), image.height());
        texture.write(queue, image);
        texture
    }

    /// Uploads `image`, recreating the texture first when its size changed.
    /// Returns `true` when the view was replaced and bind groups referencing
    /// it must be rebuilt.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> bool {
        let recreated = image.width() != self.width || image.height() != self.height;
        if recreated {
            log::debug!(
                "{}: resizing {}x{} -> {}x{}",
                self.label,
                self.width,
                self.height,
                image.width(),
                image.height()
            );
            *self = Self::new(device, self.label, image.width(), image.height());
        }
        self.write(queue, image);
        recreated
    }

    fn write(&self, queue: &wgpu::Queue, image: &RgbaImage) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
        );
    }
}

pub fn linear_sampler(device: &wgpu::Device, label: &str, address_mode: wgpu::AddressMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
