use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::camera::PerspectiveCamera;
use crate::light::{Fog, SpotLightState};
use crate::material::{Material, MaterialKind, TextureChannel};

/// Per-frame camera, light and fog state (`@group(0)`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    /// `w` holds the cut-off distance.
    pub spot_position: [f32; 4],
    /// `w` holds the decay exponent.
    pub spot_direction: [f32; 4],
    /// Linear colour premultiplied by intensity.
    pub spot_color: [f32; 4],
    /// `x` outer cosine, `y` inner cosine.
    pub spot_cone: [f32; 4],
    pub fog_color: [f32; 4],
    /// `x` near, `y` far; `z` is 1.0 when the colour target is not sRGB
    /// and the shader has to encode its output.
    pub fog_range: [f32; 4],
}

impl GlobalUniform {
    pub fn new(
        camera: &PerspectiveCamera,
        spot: Option<&SpotLightState>,
        ambient: Vec3,
        fog: &Fog,
        encode_srgb: bool,
    ) -> Self {
        let (spot_position, spot_direction, spot_color, spot_cone) = match spot {
            Some(spot) => (
                spot.position.extend(spot.distance).into(),
                spot.direction.extend(spot.decay).into(),
                (spot.color * spot.intensity).extend(1.0).into(),
                [spot.cos_outer, spot.cos_inner, 0.0, 0.0],
            ),
            None => ([0.0; 4], [0.0, -1.0, 0.0, 1.0], [0.0; 4], [1.0, 1.0, 0.0, 0.0]),
        };
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            ambient: ambient.extend(1.0).into(),
            spot_position,
            spot_direction,
            spot_color,
            spot_cone,
            fog_color: fog.color.to_linear().extend(1.0).into(),
            fog_range: [fog.near, fog.far, if encode_srgb { 1.0 } else { 0.0 }, 0.0],
        }
    }
}

/// Per-draw transform and material parameters (`@group(1)`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    /// Linear colour; alpha is the opacity.
    pub color: [f32; 4],
    /// Roughness, metalness, AO intensity, displacement scale.
    pub surface: [f32; 4],
    /// 1.0 where the albedo, AO, normal and roughness maps are bound.
    pub maps: [f32; 4],
    /// `x` displacement map bound.
    pub extra_maps: [f32; 4],
}

impl ObjectUniform {
    /// `ready[channel.index()]` tells whether that channel has real pixels.
    pub fn new(model: Mat4, material: &Material, ready: [bool; 5]) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let flag = |channel: TextureChannel| {
            if ready[channel.index()] {
                1.0
            } else {
                0.0
            }
        };
        let (color, surface) = match &material.kind {
            MaterialKind::Standard(standard) => (
                standard.color.to_linear().extend(1.0),
                [
                    standard.roughness,
                    standard.metalness,
                    standard.ao_intensity,
                    standard.displacement_scale,
                ],
            ),
            MaterialKind::Basic(basic) => {
                let opacity = if basic.transparent { basic.opacity } else { 1.0 };
                (basic.color.to_linear().extend(opacity), [1.0, 0.0, 1.0, 0.0])
            }
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: color.into(),
            surface,
            maps: [
                flag(TextureChannel::Albedo),
                flag(TextureChannel::AmbientOcclusion),
                flag(TextureChannel::Normal),
                flag(TextureChannel::Roughness),
            ],
            extra_maps: [flag(TextureChannel::Displacement), 0.0, 0.0, 0.0],
        }
    }
}

pub(crate) fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

/// Neutral texel bound when a channel has no image yet.
pub(crate) fn neutral_texel(channel: TextureChannel) -> [u8; 4] {
    match channel {
        TextureChannel::Albedo | TextureChannel::AmbientOcclusion | TextureChannel::Roughness => {
            [255, 255, 255, 255]
        }
        TextureChannel::Normal => [128, 128, 255, 255],
        TextureChannel::Displacement => [0, 0, 0, 255],
    }
}

pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    spot_position: vec4<f32>,
    spot_direction: vec4<f32>,
    spot_color: vec4<f32>,
    spot_cone: vec4<f32>,
    fog_color: vec4<f32>,
    fog_range: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    surface: vec4<f32>,
    maps: vec4<f32>,
    extra_maps: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

@group(2) @binding(0) var albedo_map: texture_2d<f32>;
@group(2) @binding(1) var ao_map: texture_2d<f32>;
@group(2) @binding(2) var normal_map: texture_2d<f32>;
@group(2) @binding(3) var roughness_map: texture_2d<f32>;
@group(2) @binding(4) var displacement_map: texture_2d<f32>;
@group(2) @binding(5) var map_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) uv2: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) uv2: vec2<f32>,
    @location(4) view_depth: f32,
}

// Image rows are stored top-down while UVs grow upwards.
fn image_uv(uv: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(uv.x, 1.0 - uv.y);
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    let height = textureSampleLevel(displacement_map, map_sampler, image_uv(input.uv), 0.0).r;
    let displaced = input.position
        + input.normal * height * object.surface.w * object.extra_maps.x;
    let world_position = object.model * vec4<f32>(displaced, 1.0);

    let normal_matrix = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    );

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;
    out.normal = normalize(normal_matrix * input.normal);
    out.uv = input.uv;
    out.uv2 = input.uv2;
    out.view_depth = out.clip_position.w;
    return out;
}

fn linear_to_srgb(color: vec3<f32>) -> vec3<f32> {
    let clamped = max(color, vec3<f32>(0.0));
    let low = clamped * 12.92;
    let high = 1.055 * pow(clamped, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(high, low, clamped <= vec3<f32>(0.0031308));
}

fn encode_output(color: vec3<f32>, alpha: f32) -> vec4<f32> {
    let encoded = select(color, linear_to_srgb(color), globals.fog_range.z > 0.5);
    return vec4<f32>(encoded, alpha);
}

fn apply_fog(color: vec3<f32>, depth: f32) -> vec3<f32> {
    let amount = smoothstep(globals.fog_range.x, globals.fog_range.y, depth);
    return mix(color, globals.fog_color.rgb, amount);
}

// Tangent frame from screen-space derivatives; framebuffer y points down, so
// the y derivatives are negated.
fn perturb_normal(world_pos: vec3<f32>, normal: vec3<f32>, uv: vec2<f32>, map_normal: vec3<f32>) -> vec3<f32> {
    let q0 = dpdx(world_pos);
    let q1 = -dpdy(world_pos);
    let st0 = dpdx(uv);
    let st1 = -dpdy(uv);

    let q1perp = cross(q1, normal);
    let q0perp = cross(normal, q0);
    let tangent = q1perp * st0.x + q0perp * st1.x;
    let bitangent = q1perp * st0.y + q0perp * st1.y;

    let det = max(dot(tangent, tangent), dot(bitangent, bitangent));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return normalize(mat3x3<f32>(tangent * scale, bitangent * scale, normal) * map_normal);
}

fn spot_light(world_pos: vec3<f32>, normal: vec3<f32>, view_dir: vec3<f32>, albedo: vec3<f32>, roughness: f32, metalness: f32) -> vec3<f32> {
    let to_light = globals.spot_position.xyz - world_pos;
    let light_distance = length(to_light);
    let light_dir = to_light / max(light_distance, 0.0001);

    let angle_cos = dot(light_dir, -globals.spot_direction.xyz);
    let cone = smoothstep(globals.spot_cone.x, globals.spot_cone.y, angle_cos);

    let cutoff = globals.spot_position.w;
    let falloff = pow(clamp(1.0 - light_distance / max(cutoff, 0.0001), 0.0, 1.0), globals.spot_direction.w);
    let reach = select(1.0, falloff, cutoff > 0.0);

    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let half_dir = normalize(light_dir + view_dir);
    let alpha = max(roughness * roughness, 0.001);
    let shininess = clamp(2.0 / (alpha * alpha) - 2.0, 1.0, 1024.0);
    let specular = pow(max(dot(normal, half_dir), 0.0), shininess) * (shininess + 2.0) / 8.0;
    let f0 = mix(vec3<f32>(0.04), albedo, metalness);
    let diffuse = albedo * (1.0 - metalness);

    return globals.spot_color.rgb * (reach * cone * n_dot_l) * (diffuse + f0 * specular);
}

@fragment
fn fs_standard(input: VertexOutput, @builtin(front_facing) is_front: bool) -> @location(0) vec4<f32> {
    let map_uv = image_uv(input.uv);
    let albedo_sample = textureSample(albedo_map, map_sampler, map_uv);
    let ao_sample = textureSample(ao_map, map_sampler, image_uv(input.uv2)).r;
    let normal_sample = textureSample(normal_map, map_sampler, map_uv).xyz * 2.0 - 1.0;
    let roughness_sample = textureSample(roughness_map, map_sampler, map_uv).g;

    let geometric = normalize(input.normal);
    let facing = select(-geometric, geometric, is_front);
    let mapped = perturb_normal(input.world_pos, facing, input.uv, normal_sample);
    let normal = normalize(mix(facing, mapped, object.maps.z));

    let albedo = object.color.rgb * mix(vec3<f32>(1.0), albedo_sample.rgb, object.maps.x);
    let roughness = clamp(object.surface.x * mix(1.0, roughness_sample, object.maps.w), 0.04, 1.0);
    let occlusion = mix(1.0, (ao_sample - 1.0) * object.surface.z + 1.0, object.maps.y);

    let view_dir = normalize(globals.camera_position.xyz - input.world_pos);
    var color = globals.ambient.rgb * albedo * occlusion;
    color += spot_light(input.world_pos, normal, view_dir, albedo, roughness, object.surface.y);

    return encode_output(apply_fog(color, input.view_depth), object.color.a);
}

@fragment
fn fs_basic(input: VertexOutput) -> @location(0) vec4<f32> {
    return encode_output(apply_fog(object.color.rgb, input.view_depth), object.color.a);
}
"#;
