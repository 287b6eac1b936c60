use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga::ShaderStage;

/// Number of vertices submitted for the full-screen quad (two triangles).
pub(crate) const QUAD_VERTEX_COUNT: u32 = 6;

/// Compiles the static full-screen quad vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    }))
}

/// Compiles the two-color split fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fade fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Full-screen quad emitted straight from the vertex index; no vertex buffer.
///
/// `v_uv` runs from (0,0) at the bottom-left corner to (1,1) at the top-right,
/// matching the bottom-up split the fragment shader expects.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[6] = vec2[6](
    vec2(-1.0, -1.0),
    vec2(1.0, -1.0),
    vec2(1.0, 1.0),
    vec2(-1.0, -1.0),
    vec2(1.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    vec2 pos = positions[uint(gl_VertexIndex)];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// The uniform block layout must match [`FadeUniforms`](crate::gpu) in `gpu.rs`.
///
/// Rows below `u_value` show the first color, rows above show the second, so
/// the scalar sweeping between -1 and 1 reads as a fill draining and refilling
/// across the surface.
const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FadeParams {
    vec3 u_color1;
    float u_value;
    vec3 u_color2;
    float u_padding;
} params;

void main() {
    if (v_uv.y < params.u_value) {
        outColor = vec4(params.u_color1, 1.0);
    } else {
        outColor = vec4(params.u_color2, 1.0);
    }
}
";
