// WGSL sources for every scene pipeline.
//
// Each pipeline body is appended to a shared prelude that declares the scene
// uniform block (group 0, binding 0) and the fog helpers, so fog and timing
// stay consistent across ground, grass, swarm and ribbons.
//
// Uniform layout must match render::SceneUniforms:
//   view_proj  mat4x4
//   camera_pos xyz = eye,        w = time (s)
//   fog        rgb = fog colour, w = density
//   light_dir  xyz = direction light travels
//   wind       x = strength, y = speed, zw = XZ direction

pub const PRELUDE: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    fog: vec4<f32>,
    light_dir: vec4<f32>,
    wind: vec4<f32>,
};

@group(0) @binding(0) var<uniform> scene: SceneUniforms;

// Exponential-squared fog in [0, 1]
fn fog_amount(world: vec3<f32>) -> f32 {
    let d = distance(world, scene.camera_pos.xyz) * scene.fog.w;
    return clamp(1.0 - exp(-d * d), 0.0, 1.0);
}

fn apply_fog(color: vec3<f32>, world: vec3<f32>) -> vec3<f32> {
    return mix(color, scene.fog.rgb, vec3<f32>(fog_amount(world)));
}
"#;

/// Lit, instanced mesh: ground (one identity instance) and the player sphere.
pub const MESH_BODY: &str = r#"
struct MeshIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) offset_scale: vec4<f32>,
};

struct MeshOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

@vertex
fn vs_main(in: MeshIn) -> MeshOut {
    let world = in.position * in.offset_scale.w + in.offset_scale.xyz;
    var out: MeshOut;
    out.clip = scene.view_proj * vec4<f32>(world, 1.0);
    out.world = world;
    out.normal = in.normal;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: MeshOut) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let l = normalize(-scene.light_dir.xyz);
    let diffuse = max(dot(n, l), 0.0);
    let lit = in.color * (0.35 + 0.65 * diffuse);
    return vec4<f32>(apply_fog(lit, in.world), 1.0);
}
"#;

/// Instanced grass blades with wind sway growing toward the tip.
pub const GRASS_BODY: &str = r#"
struct GrassIn {
    @location(0) blade: vec2<f32>,
    @location(1) root_rotation: vec4<f32>,
    @location(2) color_height: vec4<f32>,
    @location(3) phase_width: vec2<f32>,
};

struct GrassOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(in: GrassIn) -> GrassOut {
    let along = in.blade.y;
    let root = in.root_rotation.xyz;
    let facing = vec3<f32>(cos(in.root_rotation.w), 0.0, sin(in.root_rotation.w));
    let across = facing * in.blade.x * in.phase_width.y;

    let time = scene.camera_pos.w;
    let wave = sin(time * scene.wind.y + in.phase_width.x + root.x * 0.15 + root.z * 0.1);
    let bend = wave * scene.wind.x * along * along;
    let sway = vec3<f32>(scene.wind.z, 0.0, scene.wind.w) * bend;

    let world = root + across + vec3<f32>(0.0, along * in.color_height.w, 0.0) + sway;
    var out: GrassOut;
    out.clip = scene.view_proj * vec4<f32>(world, 1.0);
    out.world = world;
    out.color = in.color_height.rgb * (0.45 + 0.55 * along);
    return out;
}

@fragment
fn fs_main(in: GrassOut) -> @location(0) vec4<f32> {
    return vec4<f32>(apply_fog(in.color, in.world), 1.0);
}
"#;

/// Glowing swarm cubes, pulsing per instance. Drawn additively.
pub const SWARM_BODY: &str = r#"
struct SwarmIn {
    @location(0) position: vec3<f32>,
    @location(1) center: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct SwarmOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(in: SwarmIn) -> SwarmOut {
    // color.a carries the instance phase in [0, 1)
    let pulse = 0.6 + 0.4 * sin(scene.camera_pos.w * 3.0 + in.color.a * 6.2831853);
    let world = in.center + in.position * pulse;
    var out: SwarmOut;
    out.clip = scene.view_proj * vec4<f32>(world, 1.0);
    out.world = world;
    out.color = in.color.rgb * pulse;
    return out;
}

@fragment
fn fs_main(in: SwarmOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color * (1.0 - fog_amount(in.world)), 1.0);
}
"#;

/// Trail ribbons. Vertex colours arrive premultiplied by their fade alpha.
pub const RIBBON_BODY: &str = r#"
struct RibbonIn {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct RibbonOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: RibbonIn) -> RibbonOut {
    var out: RibbonOut;
    out.clip = scene.view_proj * vec4<f32>(in.position, 1.0);
    out.world = in.position;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: RibbonOut) -> @location(0) vec4<f32> {
    let keep = 1.0 - fog_amount(in.world);
    return vec4<f32>(in.color.rgb * keep, in.color.a * keep);
}
"#;

/// Prelude + pipeline body as one WGSL module.
pub fn compose(body: &str) -> String {
    let mut source = String::with_capacity(PRELUDE.len() + body.len() + 1);
    source.push_str(PRELUDE);
    source.push('\n');
    source.push_str(body);
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODIES: [(&str, &str); 4] = [
        ("mesh", MESH_BODY),
        ("grass", GRASS_BODY),
        ("swarm", SWARM_BODY),
        ("ribbon", RIBBON_BODY),
    ];

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_compose_prepends_prelude() {
        let source = compose(RIBBON_BODY);
        assert!(source.starts_with(PRELUDE));
        assert!(source.ends_with(RIBBON_BODY));
    }

    #[test]
    fn test_every_pipeline_validates() {
        for (name, body) in BODIES {
            if let Err(e) = validate_wgsl(&compose(body)) {
                panic!("{name} shader invalid: {e}");
            }
        }
    }

    #[test]
    fn test_every_pipeline_has_entry_points() {
        for (name, body) in BODIES {
            assert!(body.contains("fn vs_main"), "{name} missing vs_main");
            assert!(body.contains("fn fs_main"), "{name} missing fs_main");
        }
    }
}
