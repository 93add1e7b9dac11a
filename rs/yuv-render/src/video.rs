//! Video rendering using wgpu.

use wgpu::util::DeviceExt;
use yuv_lite::{Chroma, Frame, Picture, RenderError, Renderer};

/// The conversion shader; see [initialize].
pub const SHADER: &str = include_str!("shaders/video.wgsl");

/// The corners of the surface, in clip space.
#[rustfmt::skip]
pub const QUAD: [[f32; 2]; 4] = [
	[-1.0, -1.0], // Bottom left
	[ 1.0, -1.0], // Bottom right
	[-1.0,  1.0], // Top left
	[ 1.0,  1.0], // Top right
];

/// Two triangles sharing the diagonal, six vertices in total.
pub const INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Where frames are drawn.
pub enum Target {
	/// A window owned by the host application.
	Window {
		surface: wgpu::SurfaceTarget<'static>,
		width: u32,
		height: u32,
	},

	/// A texture that is never presented, for headless playback.
	Offscreen { width: u32, height: u32 },
}

impl Target {
	pub fn window(window: impl Into<wgpu::SurfaceTarget<'static>>, width: u32, height: u32) -> Self {
		Self::Window {
			surface: window.into(),
			width,
			height,
		}
	}

	pub fn offscreen(width: u32, height: u32) -> Self {
		Self::Offscreen { width, height }
	}

	pub fn size(&self) -> (u32, u32) {
		match self {
			Self::Window { width, height, .. } => (*width, *height),
			Self::Offscreen { width, height } => (*width, *height),
		}
	}
}

enum Output {
	Surface {
		surface: wgpu::Surface<'static>,
		config: wgpu::SurfaceConfiguration,
	},
	Offscreen {
		texture: wgpu::Texture,
	},
}

/// The GPU resources needed to draw frames: one pipeline, three plane textures and the quad.
///
/// Create with [initialize]; owned by whoever drives the render loop.
pub struct RenderContext {
	device: wgpu::Device,
	queue: wgpu::Queue,
	output: Output,
	pipeline: wgpu::RenderPipeline,
	vertex_buffer: wgpu::Buffer,
	index_buffer: wgpu::Buffer,
	bind_group_layout: wgpu::BindGroupLayout,
	sampler: wgpu::Sampler,
	planes: Planes,
	chroma: Chroma,
}

/// Compile the shaders and allocate every GPU resource for the given target.
///
/// Any failure, including a shader compile or link error, is fatal; there is no fallback path.
pub async fn initialize(target: Target, chroma: Chroma) -> Result<RenderContext, RenderError> {
	let (width, height) = target.size();
	if width == 0 || height == 0 {
		return Err(RenderError::Init(format!("invalid target size: {width}x{height}")));
	}

	let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
		backends: wgpu::Backends::all(),
		..Default::default()
	});

	let surface = match target {
		Target::Window { surface, .. } => Some(
			instance
				.create_surface(surface)
				.map_err(|e| RenderError::Init(format!("failed to create surface: {e}")))?,
		),
		Target::Offscreen { .. } => None,
	};

	let adapter = instance
		.request_adapter(&wgpu::RequestAdapterOptions {
			power_preference: wgpu::PowerPreference::HighPerformance,
			compatible_surface: surface.as_ref(),
			force_fallback_adapter: false,
		})
		.await
		.ok_or_else(|| RenderError::Init("failed to find suitable adapter".to_string()))?;

	let (device, queue) = adapter
		.request_device(
			&wgpu::DeviceDescriptor {
				label: Some("Video Renderer Device"),
				required_features: wgpu::Features::empty(),
				required_limits: wgpu::Limits::default(),
				memory_hints: Default::default(),
			},
			None,
		)
		.await
		.map_err(|e| RenderError::Init(format!("failed to create device: {e}")))?;

	// Errors after initialization are reported here instead of panicking.
	device.on_uncaptured_error(Box::new(|err| {
		tracing::warn!(%err, "GPU error");
	}));

	let (output, format) = match surface {
		Some(surface) => {
			let caps = surface.get_capabilities(&adapter);

			// The shader outputs gamma encoded values already.
			let format = caps
				.formats
				.iter()
				.copied()
				.find(|f| !f.is_srgb())
				.or_else(|| caps.formats.first().copied())
				.ok_or_else(|| RenderError::Init("surface is not supported by the adapter".to_string()))?;

			let config = wgpu::SurfaceConfiguration {
				usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
				format,
				width,
				height,
				present_mode: wgpu::PresentMode::Fifo,
				alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
				view_formats: vec![],
				desired_maximum_frame_latency: 2,
			};

			surface.configure(&device, &config);
			(Output::Surface { surface, config }, format)
		}
		None => {
			let texture = device.create_texture(&wgpu::TextureDescriptor {
				label: Some("Offscreen Target"),
				size: wgpu::Extent3d {
					width,
					height,
					depth_or_array_layers: 1,
				},
				mip_level_count: 1,
				sample_count: 1,
				dimension: wgpu::TextureDimension::D2,
				format: OFFSCREEN_FORMAT,
				usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
				view_formats: &[],
			});

			(Output::Offscreen { texture }, OFFSCREEN_FORMAT)
		}
	};

	device.push_error_scope(wgpu::ErrorFilter::Validation);

	let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
		label: Some("Video Shader"),
		source: wgpu::ShaderSource::Wgsl(SHADER.into()),
	});

	// Y, U and V at bindings 0, 1 and 2, sharing the sampler at 3.
	let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
		label: Some("YUV Bind Group Layout"),
		entries: &[
			plane_layout_entry(0),
			plane_layout_entry(1),
			plane_layout_entry(2),
			wgpu::BindGroupLayoutEntry {
				binding: 3,
				visibility: wgpu::ShaderStages::FRAGMENT,
				ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
				count: None,
			},
		],
	});

	let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
		label: Some("Video Render Pipeline Layout"),
		bind_group_layouts: &[&bind_group_layout],
		push_constant_ranges: &[],
	});

	let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
		label: Some("Video Render Pipeline"),
		layout: Some(&pipeline_layout),
		vertex: wgpu::VertexState {
			module: &shader,
			entry_point: Some("vs_main"),
			buffers: &[wgpu::VertexBufferLayout {
				array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
				step_mode: wgpu::VertexStepMode::Vertex,
				attributes: &[wgpu::VertexAttribute {
					offset: 0,
					shader_location: 0,
					format: wgpu::VertexFormat::Float32x2,
				}],
			}],
			compilation_options: Default::default(),
		},
		fragment: Some(wgpu::FragmentState {
			module: &shader,
			entry_point: Some("fs_main"),
			targets: &[Some(wgpu::ColorTargetState {
				format,
				blend: Some(wgpu::BlendState::REPLACE),
				write_mask: wgpu::ColorWrites::ALL,
			})],
			compilation_options: Default::default(),
		}),
		primitive: wgpu::PrimitiveState {
			topology: wgpu::PrimitiveTopology::TriangleList,
			strip_index_format: None,
			front_face: wgpu::FrontFace::Ccw,
			cull_mode: None,
			polygon_mode: wgpu::PolygonMode::Fill,
			unclipped_depth: false,
			conservative: false,
		},
		depth_stencil: None,
		multisample: wgpu::MultisampleState {
			count: 1,
			mask: !0,
			alpha_to_coverage_enabled: false,
		},
		multiview: None,
		cache: None,
	});

	if let Some(err) = device.pop_error_scope().await {
		return Err(RenderError::Init(format!("failed to build pipeline: {err}")));
	}

	let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
		label: Some("Video Vertex Buffer"),
		contents: bytemuck::cast_slice(&QUAD),
		usage: wgpu::BufferUsages::VERTEX,
	});

	let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
		label: Some("Video Index Buffer"),
		contents: bytemuck::cast_slice(&INDICES),
		usage: wgpu::BufferUsages::INDEX,
	});

	let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
		label: Some("YUV Sampler"),
		address_mode_u: wgpu::AddressMode::ClampToEdge,
		address_mode_v: wgpu::AddressMode::ClampToEdge,
		address_mode_w: wgpu::AddressMode::ClampToEdge,
		mag_filter: wgpu::FilterMode::Linear,
		min_filter: wgpu::FilterMode::Linear,
		mipmap_filter: wgpu::FilterMode::Nearest,
		..Default::default()
	});

	// Sized for the target until the first frame says otherwise.
	let planes = Planes::new(&device, &bind_group_layout, &sampler, width, height, chroma);

	tracing::info!(width, height, ?format, %chroma, backend = ?adapter.get_info().backend, "renderer initialized");

	Ok(RenderContext {
		device,
		queue,
		output,
		pipeline,
		vertex_buffer,
		index_buffer,
		bind_group_layout,
		sampler,
		planes,
		chroma,
	})
}

fn plane_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
	wgpu::BindGroupLayoutEntry {
		binding,
		visibility: wgpu::ShaderStages::FRAGMENT,
		ty: wgpu::BindingType::Texture {
			sample_type: wgpu::TextureSampleType::Float { filterable: true },
			view_dimension: wgpu::TextureViewDimension::D2,
			multisampled: false,
		},
		count: None,
	}
}

impl RenderContext {
	/// Decode the frame, upload its planes and draw it.
	///
	/// Nothing is uploaded if the payload doesn't match the frame dimensions.
	pub fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
		let picture = frame.decode(self.chroma)?;
		self.render_picture(&picture)
	}

	/// Upload an already decoded picture and draw it.
	///
	/// The picture must use the chroma layout the context was created with.
	pub fn render_picture(&mut self, picture: &Picture) -> Result<(), RenderError> {
		if picture.chroma != self.chroma {
			return Err(RenderError::Render(format!(
				"expected {} picture, got {}",
				self.chroma, picture.chroma
			)));
		}

		// Textures have a fixed size, so a new resolution means new textures.
		if self.planes.size() != (picture.width(), picture.height()) {
			tracing::debug!(width = picture.width(), height = picture.height(), "resizing plane textures");
			self.planes = Planes::new(
				&self.device,
				&self.bind_group_layout,
				&self.sampler,
				picture.width(),
				picture.height(),
				self.chroma,
			);
		}

		self.planes.upload(&self.queue, picture);

		match &self.output {
			Output::Surface { surface, config } => {
				let texture = match surface.get_current_texture() {
					Ok(texture) => texture,
					Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
						surface.configure(&self.device, config);
						return Err(RenderError::Render(format!("surface reconfigured: {err}")));
					}
					Err(err) => return Err(RenderError::Render(format!("failed to get surface texture: {err}"))),
				};

				let view = texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
				self.draw(&view);
				texture.present();
			}
			Output::Offscreen { texture } => {
				let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
				self.draw(&view);
			}
		}

		Ok(())
	}

	fn draw(&self, view: &wgpu::TextureView) {
		let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
			label: Some("Video Render Encoder"),
		});

		{
			let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
				label: Some("Video Render Pass"),
				color_attachments: &[Some(wgpu::RenderPassColorAttachment {
					view,
					resolve_target: None,
					ops: wgpu::Operations {
						load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
						store: wgpu::StoreOp::Store,
					},
				})],
				depth_stencil_attachment: None,
				timestamp_writes: None,
				occlusion_query_set: None,
			});

			render_pass.set_pipeline(&self.pipeline);
			render_pass.set_bind_group(0, &self.planes.bind_group, &[]);
			render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
			render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
			render_pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
		}

		self.queue.submit(Some(encoder.finish()));
	}
}

impl Renderer for RenderContext {
	fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
		RenderContext::render(self, frame)
	}
}

/// The Y, U and V textures for a single resolution.
struct Planes {
	y: wgpu::Texture,
	u: wgpu::Texture,
	v: wgpu::Texture,
	bind_group: wgpu::BindGroup,
}

impl Planes {
	fn new(
		device: &wgpu::Device,
		layout: &wgpu::BindGroupLayout,
		sampler: &wgpu::Sampler,
		width: u32,
		height: u32,
		chroma: Chroma,
	) -> Self {
		let (chroma_width, chroma_height) = chroma.plane(width, height);

		let y = plane_texture(device, "Y Plane", width, height);
		let u = plane_texture(device, "U Plane", chroma_width, chroma_height);
		let v = plane_texture(device, "V Plane", chroma_width, chroma_height);

		let y_view = y.create_view(&wgpu::TextureViewDescriptor::default());
		let u_view = u.create_view(&wgpu::TextureViewDescriptor::default());
		let v_view = v.create_view(&wgpu::TextureViewDescriptor::default());

		let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
			label: Some("YUV Bind Group"),
			layout,
			entries: &[
				wgpu::BindGroupEntry {
					binding: 0,
					resource: wgpu::BindingResource::TextureView(&y_view),
				},
				wgpu::BindGroupEntry {
					binding: 1,
					resource: wgpu::BindingResource::TextureView(&u_view),
				},
				wgpu::BindGroupEntry {
					binding: 2,
					resource: wgpu::BindingResource::TextureView(&v_view),
				},
				wgpu::BindGroupEntry {
					binding: 3,
					resource: wgpu::BindingResource::Sampler(sampler),
				},
			],
		});

		Self { y, u, v, bind_group }
	}

	fn size(&self) -> (u32, u32) {
		(self.y.width(), self.y.height())
	}

	// Replaces the full contents of each texture.
	fn upload(&self, queue: &wgpu::Queue, picture: &Picture) {
		for (texture, plane) in [(&self.y, &picture.y), (&self.u, &picture.u), (&self.v, &picture.v)] {
			queue.write_texture(
				wgpu::ImageCopyTexture {
					texture,
					mip_level: 0,
					origin: wgpu::Origin3d::ZERO,
					aspect: wgpu::TextureAspect::All,
				},
				&plane.data,
				wgpu::ImageDataLayout {
					offset: 0,
					bytes_per_row: Some(plane.width),
					rows_per_image: Some(plane.height),
				},
				wgpu::Extent3d {
					width: plane.width,
					height: plane.height,
					depth_or_array_layers: 1,
				},
			);
		}
	}
}

fn plane_texture(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::Texture {
	device.create_texture(&wgpu::TextureDescriptor {
		label: Some(label),
		size: wgpu::Extent3d {
			width,
			height,
			depth_or_array_layers: 1,
		},
		mip_level_count: 1,
		sample_count: 1,
		dimension: wgpu::TextureDimension::D2,
		format: wgpu::TextureFormat::R8Unorm,
		usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
		view_formats: &[],
	})
}
