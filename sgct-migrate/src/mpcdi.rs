//! Conversion of MPCDI calibration descriptors into a fresh configuration.
//!
//! Every `display/buffer` of the descriptor becomes one node with a single
//! window and a single texture-mapped viewport. The frustum of the buffer's
//! first region drives the projection, and the geometry warp files listed
//! under `files` are assigned to the nodes by position.

use sgct_config::{
    CURRENT_VERSION, Config, Display, Fov, Node, Orientation, PlanarProjection, Projection,
    Settings, User, Vec2, Vec3, Viewport, Window,
};

use crate::{
    coerce,
    error::{Result, ShapeError, ShapeErrorKind},
    options::ForeignDefaults,
    tree::{Map, Tree},
};

/// All entries stored under `key`, whether wrapped once or repeated.
fn entries<'t>(tree: &'t Tree, key: &str) -> std::slice::Iter<'t, Tree> {
    tree.get(key)
        .and_then(Tree::items)
        .unwrap_or_default()
        .iter()
}

fn mapping<'t>(tree: &'t Tree, path: &str) -> Result<&'t Map, ShapeError> {
    tree.as_map()
        .ok_or_else(|| ShapeError::new(path, ShapeErrorKind::NotAMapping(tree.kind_name())))
}

fn optional_number(map: &Map, name: &str, path: &str) -> Result<Option<f64>, ShapeError> {
    if map.contains_key(name) {
        coerce::component(map, name, path).map(Some)
    } else {
        Ok(None)
    }
}

/// Geometry warp file paths in document order.
fn warp_files(root: &Tree) -> Vec<String> {
    entries(root, "files")
        .flat_map(|files| entries(files, "fileset"))
        .flat_map(|fileset| entries(fileset, "geometryWarpFile"))
        .flat_map(|warp| entries(warp, "path"))
        .filter_map(Tree::text)
        .collect()
}

/// Extracts the node number from a buffer id such as `surface3`.
fn node_number(id: &str, prefix: &str, path: &str) -> Result<u16, ShapeError> {
    id.strip_prefix(prefix)
        .and_then(|n| n.parse::<u16>().ok())
        .ok_or_else(|| {
            ShapeError::new(
                path,
                ShapeErrorKind::BadIdentifier {
                    value: id.to_string(),
                    prefix: prefix.to_string(),
                },
            )
        })
}

fn frustum(region: &Tree, path: &str) -> Result<(Fov, Orientation), ShapeError> {
    let frustum_path = format!("{path}.frustum");
    let frustum = entries(region, "frustum").next().ok_or_else(|| {
        ShapeError::new(path, ShapeErrorKind::MissingField("frustum".to_string()))
    })?;
    let frustum = mapping(frustum, &frustum_path)?;
    let angle = |name: &str| coerce::component(frustum, name, &frustum_path);

    let fov = Fov {
        left: Some(angle("leftAngle")?.abs()),
        right: Some(angle("rightAngle")?.abs()),
        up: Some(angle("upAngle")?.abs()),
        down: Some(angle("downAngle")?.abs()),
        ..Default::default()
    };
    let orientation = Orientation {
        yaw: Some(angle("yaw")?),
        pitch: Some(angle("pitch")?),
        roll: Some(angle("roll")?),
        ..Default::default()
    };
    Ok((fov, orientation))
}

fn buffer_node(
    buffer: &Tree,
    path: &str,
    meshes: &[String],
    defaults: &ForeignDefaults,
) -> Result<Node, ShapeError> {
    let attrs = mapping(buffer, path)?;
    let id = attrs.get("id").and_then(Tree::text).ok_or_else(|| {
        ShapeError::new(path, ShapeErrorKind::MissingField("id".to_string()))
    })?;
    let id_path = format!("{path}.id");
    let number = node_number(&id, &defaults.buffer_prefix, &id_path)?;
    let port = defaults.base_port.checked_add(number).ok_or_else(|| {
        ShapeError::new(
            &id_path,
            ShapeErrorKind::BadIdentifier {
                value: id.clone(),
                prefix: defaults.buffer_prefix.clone(),
            },
        )
    })?;
    let address = format!("{}{number}", defaults.address_prefix);

    let size = Vec2 {
        x: coerce::component(attrs, "Xresolution", path)?,
        y: coerce::component(attrs, "Yresolution", path)?,
    };

    let region_path = format!("{path}.region[0]");
    let region = entries(buffer, "region").next().ok_or_else(|| {
        ShapeError::new(path, ShapeErrorKind::MissingField("region".to_string()))
    })?;
    let region_attrs = mapping(region, &region_path)?;
    let field = |name: &str, default: f64| {
        optional_number(region_attrs, name, &region_path).map(|v| v.unwrap_or(default))
    };
    let pos = Vec2 {
        x: field("x", 0.0)?,
        y: field("y", 0.0)?,
    };
    let extent = Vec2 {
        x: field("xsize", 1.0)?,
        y: field("ysize", 1.0)?,
    };
    let (fov, orientation) = frustum(region, &region_path)?;

    let mesh = usize::from(number)
        .checked_sub(1)
        .and_then(|i| meshes.get(i))
        .cloned();
    if mesh.is_none() {
        warn!(
            "{path}: no geometry warp file for node {number} ({} listed)",
            meshes.len()
        );
    }

    let viewport = Viewport {
        user: None,
        overlay: None,
        blendmask: None,
        blacklevelmask: None,
        mesh,
        tracked: Some(true),
        eye: None,
        pos: Some(pos),
        size: Some(extent),
        projection: Projection::TextureMapped(PlanarProjection {
            fov: Some(fov),
            orientation: Some(orientation),
            offset: None,
        }),
    };
    let window = Window {
        id: Some(0),
        name: Some(address.clone()),
        border: Some(false),
        fxaa: Some(false),
        msaa: Some(1),
        size,
        res: Some(Vec2 {
            x: size.x * defaults.render_scale,
            y: size.y * defaults.render_scale,
        }),
        viewports: vec![viewport],
        ..Default::default()
    };

    debug!("{path}: buffer `{id}` becomes node {address}:{port}");
    Ok(Node {
        address,
        port,
        windows: vec![window],
        ..Default::default()
    })
}

/// Builds a configuration from a parsed MPCDI document.
///
/// Descriptor-level attributes (`profile`, `geometry`, `color`, `date`) and
/// the `files` block have no counterpart in the result and are dropped.
///
/// # Errors
///
/// Returns a [`ShapeError`] when a buffer lacks its id, resolution, region
/// or frustum, or when its id does not follow the configured prefix.
pub fn transform(root: &Tree, defaults: &ForeignDefaults) -> Result<Config> {
    mapping(root, "document")?;
    let meshes = warp_files(root);
    debug!("found {} geometry warp file(s)", meshes.len());

    let mut nodes = Vec::new();
    for (d, display) in entries(root, "display").enumerate() {
        for (b, buffer) in entries(display, "buffer").enumerate() {
            let path = format!("display[{d}].buffer[{b}]");
            nodes.push(buffer_node(buffer, &path, &meshes, defaults)?);
        }
    }
    info!("converted MPCDI descriptor into {} node(s)", nodes.len());

    Ok(Config {
        version: CURRENT_VERSION,
        masteraddress: Some(defaults.master_address.clone()),
        threadaffinity: None,
        debuglog: None,
        externalcontrolport: None,
        firmsync: Some(false),
        scene: None,
        users: Some(vec![User {
            eyeseparation: Some(defaults.eye_separation),
            pos: Some(Vec3::default()),
            ..Default::default()
        }]),
        settings: Some(Settings {
            display: Some(Display {
                swapinterval: Some(0),
                refreshrate: None,
            }),
            ..Default::default()
        }),
        capture: None,
        trackers: None,
        nodes,
    })
}
