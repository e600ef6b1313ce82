//! Migration of legacy (unversioned, XML-sourced) configurations.
//!
//! A document is either [`DocumentState::Current`] (it carries
//! `version == 1`) and is returned untouched, or
//! [`DocumentState::NeedsMigration`] (no `version` at all) and is rewritten
//! by the tables below. Any other version is rejected.

use sgct_config::{CURRENT_VERSION, ProjectionKind};

use crate::{
    coerce::{
        self,
        Coercion::{Boolean, Number, Text, Vec2, Vec3},
    },
    error::{MigrateError, Result, ShapeError, ShapeErrorKind},
    rules::{self, Rule, Rule::*},
    tree::{Map, Tree},
};

/// Where a document stands relative to the current format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    NeedsMigration,
    Current,
}

const NUMBERS: &[Rule] = &[EveryField(Number)];
const STRINGS: &[Rule] = &[EveryField(Text)];

const ORIENTATION: &[Rule] = &[
    Rename("Orientation", "orientation"),
    Object("orientation", NUMBERS),
];

const MATRIX: &[Rule] = &[Rename("Matrix", "matrix"), Matrix("matrix")];

const OFFSET: &[Rule] = &[Rename("Offset", "offset"), Coerce("offset", Vec3)];

const BACKGROUND: &[Rule] = &[
    Rename("Background", "background"),
    Object("background", NUMBERS),
];

const SCENE: &[Rule] = &[
    Include(OFFSET),
    Include(ORIENTATION),
    Rename("Scale", "scale"),
    Lift("scale", "value"),
    Coerce("scale", Number),
];

const USER: &[Rule] = &[
    Coerce("name", Text),
    Rename("eyeSeparation", "eyeseparation"),
    Coerce("eyeseparation", Number),
    Rename("Pos", "pos"),
    Coerce("pos", Vec3),
    Include(ORIENTATION),
    Include(MATRIX),
    Rename("Tracking", "tracking"),
    Object("tracking", STRINGS),
];

const DISPLAY: &[Rule] = &[
    Rename("swapInterval", "swapinterval"),
    Coerce("swapinterval", Number),
    Rename("refreshRate", "refreshrate"),
    Coerce("refreshrate", Number),
];

const SETTINGS: &[Rule] = &[
    Rename("DepthBufferTexture", "depthbuffertexture"),
    Coerce("depthbuffertexture", Boolean),
    Rename("NormalTexture", "normaltexture"),
    Coerce("normaltexture", Boolean),
    Rename("PositionTexture", "positiontexture"),
    Coerce("positiontexture", Boolean),
    Rename("Precision", "precision"),
    Coerce("precision", Number),
    Rename("Display", "display"),
    Object("display", DISPLAY),
];

const CAPTURE: &[Rule] = &[
    Coerce("path", Text),
    Coerce("format", Text),
    Rename("range-begin", "rangebegin"),
    Coerce("rangebegin", Number),
    Rename("range-end", "rangeend"),
    Coerce("rangeend", Number),
];

const SENSOR: &[Rule] = &[
    Rename("vrpnAddress", "vrpnaddress"),
    Coerce("vrpnaddress", Text),
    Coerce("id", Number),
];

const VRPN_GROUP: &[Rule] = &[
    Rename("vrpnAddress", "vrpnaddress"),
    Coerce("vrpnaddress", Text),
    Coerce("count", Number),
];

const DEVICE: &[Rule] = &[
    Coerce("name", Text),
    Rename("Sensor", "sensors"),
    Each("sensors", SENSOR),
    Rename("Buttons", "buttons"),
    Each("buttons", VRPN_GROUP),
    Rename("Axes", "axes"),
    Each("axes", VRPN_GROUP),
    Include(OFFSET),
    Include(ORIENTATION),
    Include(MATRIX),
];

const TRACKER: &[Rule] = &[
    Coerce("name", Text),
    Rename("Device", "devices"),
    Each("devices", DEVICE),
    Include(OFFSET),
    Include(ORIENTATION),
    Rename("Scale", "scale"),
    Coerce("scale", Number),
    Include(MATRIX),
];

const FOV: &[Rule] = &[EveryField(Number), Apply(collapse_fov)];

const PLANAR_ORIENTATION: &[Rule] = &[
    EveryField(Number),
    Rename("heading", "yaw"),
    Rename("azimuth", "yaw"),
    Rename("elevation", "pitch"),
    Rename("bank", "roll"),
];

const PLANAR: &[Rule] = &[
    Rename("FOV", "fov"),
    Object("fov", FOV),
    Rename("Orientation", "orientation"),
    Object("orientation", PLANAR_ORIENTATION),
    Rename("Offset", "offset"),
    Object("offset", NUMBERS),
];

const FISHEYE: &[Rule] = &[
    Coerce("fov", Number),
    Coerce("quality", Text),
    Coerce("interpolation", Text),
    Coerce("diameter", Number),
    Coerce("tilt", Number),
    Rename("Crop", "crop"),
    Object("crop", NUMBERS),
    Rename("keepAspectRatio", "keepaspectratio"),
    Coerce("keepaspectratio", Boolean),
    Include(OFFSET),
    Include(BACKGROUND),
];

const SPHERICAL_MIRROR: &[Rule] = &[
    Coerce("quality", Text),
    Coerce("tilt", Number),
    Include(BACKGROUND),
    Rename("Geometry", "geometry"),
    Object("geometry", STRINGS),
];

const SPOUT_CHANNELS: &[Rule] = &[
    Rename("Right", "right"),
    Coerce("right", Boolean),
    Rename("zLeft", "zleft"),
    Coerce("zleft", Boolean),
    Rename("Bottom", "bottom"),
    Coerce("bottom", Boolean),
    Rename("Top", "top"),
    Coerce("top", Boolean),
    Rename("Left", "left"),
    Coerce("left", Boolean),
    Rename("zRight", "zright"),
    Coerce("zright", Boolean),
];

const SPOUT_OUTPUT: &[Rule] = &[
    Coerce("quality", Text),
    Coerce("tilt", Number),
    Coerce("mapping", Text),
    Rename("mappingSpoutName", "mappingspoutname"),
    Coerce("mappingspoutname", Text),
    Include(BACKGROUND),
    Rename("Channels", "channels"),
    Object("channels", SPOUT_CHANNELS),
    Rename("RigOrientation", "orientation"),
    Object("orientation", NUMBERS),
];

const CYLINDRICAL: &[Rule] = &[
    Coerce("quality", Text),
    Coerce("tilt", Number),
    Coerce("rotation", Number),
    Rename("heightOffset", "heightoffset"),
    Coerce("heightoffset", Number),
    Coerce("radius", Number),
];

const EQUIRECTANGULAR: &[Rule] = &[Coerce("quality", Text), Coerce("tilt", Number)];

const PROJECTION_PLANE: &[Rule] = &[Apply(plane_corners)];

const VIEWPORT: &[Rule] = &[
    Coerce("user", Text),
    Coerce("overlay", Text),
    Rename("mask", "blendmask"),
    Rename("BlendMask", "blendmask"),
    Coerce("blendmask", Text),
    Rename("BlackLevelMask", "blacklevelmask"),
    Coerce("blacklevelmask", Text),
    Coerce("mesh", Text),
    Coerce("tracked", Boolean),
    Coerce("eye", Text),
    Rename("Pos", "pos"),
    Coerce("pos", Vec2),
    Rename("Size", "size"),
    Coerce("size", Vec2),
    // no longer supported by any reader
    Remove("name"),
    Apply(resolve_projection),
];

const WINDOW: &[Rule] = &[
    Coerce("id", Number),
    Coerce("name", Text),
    Coerce("tags", Text),
    Split("tags", ','),
    Rename("bufferBitDepth", "bufferbitdepth"),
    Coerce("bufferbitdepth", Text),
    Rename("fullScreen", "fullscreen"),
    Coerce("fullscreen", Boolean),
    Coerce("autoiconify", Boolean),
    Rename("hideMouseCursor", "hidemousecursor"),
    Coerce("hidemousecursor", Boolean),
    Coerce("floating", Boolean),
    Rename("alwaysRender", "alwaysrender"),
    Coerce("alwaysrender", Boolean),
    Coerce("hidden", Boolean),
    Rename("dbuffered", "doublebuffered"),
    Coerce("doublebuffered", Boolean),
    Rename("numberOfSamples", "msaa"),
    Coerce("msaa", Number),
    Coerce("alpha", Boolean),
    Coerce("fxaa", Boolean),
    Rename("decorated", "border"),
    Coerce("border", Boolean),
    Coerce("mirror", Boolean),
    Rename("draw2D", "draw2d"),
    Coerce("draw2d", Boolean),
    Rename("draw3D", "draw3d"),
    Coerce("draw3d", Boolean),
    Rename("blitWindowId", "blitwindowid"),
    Coerce("blitwindowid", Number),
    Coerce("monitor", Number),
    Coerce("mpcdi", Text),
    Rename("Stereo", "stereo"),
    Lift("stereo", "type"),
    Coerce("stereo", Text),
    Rename("Pos", "pos"),
    Coerce("pos", Vec2),
    Rename("Size", "size"),
    Coerce("size", Vec2),
    Rename("Res", "res"),
    Coerce("res", Vec2),
    Rename("Viewport", "viewports"),
    Each("viewports", VIEWPORT),
];

const NODE: &[Rule] = &[
    Rename("ip", "address"),
    Coerce("address", Text),
    Coerce("port", Number),
    Rename("dataTransferPort", "datatransferport"),
    Coerce("datatransferport", Number),
    Rename("swapLock", "swaplock"),
    Coerce("swaplock", Boolean),
    Rename("Window", "windows"),
    Each("windows", WINDOW),
];

/// Rules for the document root.
pub const ROOT: &[Rule] = &[
    Rename("masterAddress", "masteraddress"),
    Coerce("masteraddress", Text),
    Rename("setThreadAffinity", "threadaffinity"),
    Coerce("threadaffinity", Number),
    Rename("debugLog", "debuglog"),
    Coerce("debuglog", Boolean),
    Rename("externalControlPort", "externalcontrolport"),
    Coerce("externalcontrolport", Number),
    Rename("firmSync", "firmsync"),
    Coerce("firmsync", Boolean),
    Rename("Scene", "scene"),
    Object("scene", SCENE),
    Rename("User", "users"),
    Each("users", USER),
    Rename("Settings", "settings"),
    Object("settings", SETTINGS),
    Rename("Capture", "capture"),
    Object("capture", CAPTURE),
    Rename("Tracker", "trackers"),
    Each("trackers", TRACKER),
    Rename("Node", "nodes"),
    Each("nodes", NODE),
];

/// Legacy element name announcing a projection of the given kind.
pub fn projection_marker(kind: ProjectionKind) -> &'static str {
    match kind {
        ProjectionKind::Plane => "Projectionplane",
        other => other.discriminator(),
    }
}

fn projection_rules(kind: ProjectionKind) -> &'static [Rule] {
    match kind {
        ProjectionKind::Planar | ProjectionKind::TextureMapped => PLANAR,
        ProjectionKind::Fisheye => FISHEYE,
        ProjectionKind::SphericalMirror => SPHERICAL_MIRROR,
        ProjectionKind::SpoutOutput => SPOUT_OUTPUT,
        ProjectionKind::Cylindrical => CYLINDRICAL,
        ProjectionKind::Equirectangular => EQUIRECTANGULAR,
        ProjectionKind::Plane => PROJECTION_PLANE,
    }
}

/// Turns the single projection marker of a viewport into `projection`.
fn resolve_projection(viewport: &mut Map, path: &str) -> Result<()> {
    let found: Vec<ProjectionKind> = ProjectionKind::ALL
        .into_iter()
        .filter(|kind| viewport.contains_key(projection_marker(*kind)))
        .collect();

    let kind = match found.as_slice() {
        [] => {
            warn!("{path}: viewport has no projection");
            return Ok(());
        }
        [kind] => *kind,
        many => {
            return Err(MigrateError::AmbiguousProjection {
                path: path.to_string(),
                markers: many.iter().map(|k| projection_marker(*k)).collect(),
            });
        }
    };

    coerce::rename(viewport, projection_marker(kind), "projection");
    coerce::to_object(viewport, "projection").map_err(|e| e.within(path))?;

    let projection_path = rules::join(path, "projection");
    let Some(slot) = viewport.get_mut("projection") else {
        return Ok(());
    };
    let projection = rules::mapping(slot, &projection_path)?;
    projection.insert("type".to_string(), Tree::string(kind.discriminator()));
    rules::apply(projection_rules(kind), projection, &projection_path)
}

/// Reads a numeric field that has already been coerced.
fn number_at(map: &Map, key: &str) -> Option<f64> {
    map.get(key)?.leaf()?.to_number().ok()
}

/// Replaces two equal half-angles by their sum.
fn collapse_pair(fov: &mut Map, first: &str, second: &str, total: &str) {
    let (Some(a), Some(b)) = (number_at(fov, first), number_at(fov, second)) else {
        return;
    };
    if a == b {
        fov.insert(total.to_string(), Tree::number(a + b));
        fov.shift_remove(first);
        fov.shift_remove(second);
    }
}

/// `{left: 10, right: 10, up: 5, down: 5}` → `{hfov: 20, vfov: 10}`.
///
/// Asymmetric pairs are left untouched.
fn collapse_fov(fov: &mut Map, _path: &str) -> Result<()> {
    collapse_pair(fov, "left", "right", "hfov");
    collapse_pair(fov, "down", "up", "vfov");
    Ok(())
}

/// Moves the first three `Pos` entries of a projection plane into named corners.
fn plane_corners(projection: &mut Map, path: &str) -> Result<()> {
    const CORNERS: [&str; 3] = ["lowerleft", "upperleft", "upperright"];

    let pos = projection.shift_remove("Pos").ok_or_else(|| {
        ShapeError::new(path, ShapeErrorKind::MissingField("Pos".to_string()))
    })?;
    let pos_path = rules::join(path, "Pos");
    let found = pos.kind_name();
    let points = pos
        .items()
        .ok_or_else(|| ShapeError::new(&pos_path, ShapeErrorKind::NotASequence(found)))?;
    if points.len() > CORNERS.len() {
        warn!(
            "{pos_path}: {} points given, using the first {}",
            points.len(),
            CORNERS.len()
        );
    }
    if points.len() < CORNERS.len() {
        return Err(ShapeError::new(
            pos_path,
            ShapeErrorKind::WrongCount {
                expected: CORNERS.len(),
                found: points.len(),
            },
        )
        .into());
    }

    for (i, (name, point)) in CORNERS.iter().zip(points).enumerate() {
        let point_path = format!("{pos_path}[{i}]");
        let mut point = point.clone();
        let corner = rules::mapping(&mut point, &point_path)?;
        coerce::numbers_in_place(corner, &point_path)?;
        projection.insert(name.to_string(), point);
    }
    Ok(())
}

/// Determines from its `version` entry whether a document needs the legacy
/// rewrite.
pub fn classify(version: Option<&Tree>) -> Result<DocumentState> {
    let Some(version) = version else {
        return Ok(DocumentState::NeedsMigration);
    };
    match version.leaf() {
        Some(v) if v.to_number().ok() == Some(f64::from(CURRENT_VERSION)) => {
            Ok(DocumentState::Current)
        }
        Some(v) => Err(MigrateError::UnrecognizedVersion(v.render())),
        None => Err(MigrateError::UnrecognizedVersion(
            version.kind_name().to_string(),
        )),
    }
}

/// Brings `tree` to the current format.
///
/// A current document is returned unchanged; a legacy one is rewritten and
/// stamped with `version = 1` as its first field.
///
/// # Errors
///
/// Fails on the first mis-shaped field, on an ambiguous viewport projection,
/// and on any version other than absent or current.
pub fn migrate(tree: Tree) -> Result<Tree> {
    let mut root = match tree {
        Tree::Map(root) => root,
        other => {
            return Err(ShapeError::new(
                "document",
                ShapeErrorKind::NotAMapping(other.kind_name()),
            )
            .into());
        }
    };

    match classify(root.get("version"))? {
        DocumentState::Current => {
            debug!("configuration is already at version {CURRENT_VERSION}");
            return Ok(Tree::Map(root));
        }
        DocumentState::NeedsMigration => {
            info!("migrating legacy configuration to version {CURRENT_VERSION}");
        }
    }

    rules::apply(ROOT, &mut root, "")?;
    root.shift_insert(
        0,
        "version".to_string(),
        Tree::number(f64::from(CURRENT_VERSION)),
    );
    Ok(Tree::Map(root))
}
