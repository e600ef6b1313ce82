//! Current (version 1) configuration types.
//!
//! These structures mirror the JSON layout produced by the converter. Field
//! names are the lowercase spellings used by the current file format; every
//! optional field is omitted from the output when unset.
//!
//! # Example
//!
//! ```json
//! {
//!   "version": 1,
//!   "masteraddress": "localhost",
//!   "nodes": [
//!     {
//!       "address": "localhost",
//!       "port": 20401,
//!       "windows": [
//!         {
//!           "size": { "x": 1280, "y": 720 },
//!           "viewports": [
//!             {
//!               "projection": {
//!                 "type": "PlanarProjection",
//!                 "fov": { "hfov": 80, "vfov": 50 }
//!               }
//!             }
//!           ]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The only file format version this crate describes.
pub const CURRENT_VERSION: u32 = 1;

/// Root cluster configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Config {
    /// File format version, always [`CURRENT_VERSION`].
    #[schemars(range(min = 1, max = 1))]
    pub version: u32,
    /// Address of the master node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masteraddress: Option<String>,
    /// Thread affinity of the render thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threadaffinity: Option<i32>,
    /// Enables verbose logging in the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debuglog: Option<bool>,
    /// Port for the external control interface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub externalcontrolport: Option<u16>,
    /// Forces frame-locked synchronization between nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmsync: Option<bool>,
    /// Global scene transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
    /// Users (observers) of the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    /// Global render settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// Screenshot capture settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<Capture>,
    /// VRPN trackers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trackers: Option<Vec<Tracker>>,
    /// Machines participating in the cluster.
    pub nodes: Vec<Node>,
}

/// Two component vector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Three component vector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Rotation given either as Euler angles (degrees) or as a quaternion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Orientation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
}

/// A 4x4 matrix flattened into 16 values.
pub type Mat4 = [f64; 16];

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// An observer whose eye position drives the projections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Interocular distance in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyeseparation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Mat4>,
    /// Whether `matrix` was given in row-major order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transpose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,
}

/// Binds a user to a tracker device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Tracking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depthbuffertexture: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normaltexture: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positiontexture: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
}

/// Buffer swap behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Display {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swapinterval: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshrate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Capture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rangebegin: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rangeend: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Tracker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<Device>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Mat4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transpose: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Device {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Vec<Sensor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<VrpnChannel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<VrpnChannel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Mat4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transpose: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Sensor {
    pub vrpnaddress: String,
    pub id: i32,
}

/// A group of VRPN buttons or axes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct VrpnChannel {
    pub vrpnaddress: String,
    pub count: u32,
}

/// One machine of the cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Node {
    pub address: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatransferport: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swaplock: Option<bool>,
    pub windows: Vec<Window>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Window {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bufferbitdepth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoiconify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidemousecursor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alwaysrender: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doublebuffered: Option<bool>,
    /// Multisample anti-aliasing sample count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msaa: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fxaa: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw2d: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw3d: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blitwindowid: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpcdi: Option<String>,
    /// Stereo mode, e.g. `side_by_side`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Vec2>,
    pub size: Vec2,
    /// Internal render target resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res: Option<Vec2>,
    pub viewports: Vec<Viewport>,
}

/// A normalized sub-region of a window.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Viewport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blendmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blacklevelmask: Option<String>,
    /// Warp mesh file applied to the viewport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec2>,
    pub projection: Projection,
}

/// Projection applied to a viewport, discriminated by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "type")]
pub enum Projection {
    #[serde(rename = "PlanarProjection")]
    Planar(PlanarProjection),
    #[serde(rename = "FisheyeProjection")]
    Fisheye(FisheyeProjection),
    #[serde(rename = "SphericalMirrorProjection")]
    SphericalMirror(SphericalMirrorProjection),
    #[serde(rename = "SpoutOutputProjection")]
    SpoutOutput(SpoutOutputProjection),
    #[serde(rename = "CylindricalProjection")]
    Cylindrical(CylindricalProjection),
    #[serde(rename = "EquirectangularProjection")]
    Equirectangular(EquirectangularProjection),
    #[serde(rename = "ProjectionPlane")]
    Plane(ProjectionPlane),
    /// Planar frustum whose image is warped through the viewport mesh.
    #[serde(rename = "TextureMappedProjection")]
    TextureMapped(PlanarProjection),
}

/// Field-less mirror of [`Projection`] used to enumerate the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    Planar,
    Fisheye,
    SphericalMirror,
    SpoutOutput,
    Cylindrical,
    Equirectangular,
    Plane,
    TextureMapped,
}

impl ProjectionKind {
    /// All variants in their canonical order.
    pub const ALL: [ProjectionKind; 8] = [
        ProjectionKind::Planar,
        ProjectionKind::Fisheye,
        ProjectionKind::SphericalMirror,
        ProjectionKind::SpoutOutput,
        ProjectionKind::Cylindrical,
        ProjectionKind::Equirectangular,
        ProjectionKind::Plane,
        ProjectionKind::TextureMapped,
    ];

    /// The `type` discriminator written into the projection object.
    pub fn discriminator(self) -> &'static str {
        match self {
            ProjectionKind::Planar => "PlanarProjection",
            ProjectionKind::Fisheye => "FisheyeProjection",
            ProjectionKind::SphericalMirror => "SphericalMirrorProjection",
            ProjectionKind::SpoutOutput => "SpoutOutputProjection",
            ProjectionKind::Cylindrical => "CylindricalProjection",
            ProjectionKind::Equirectangular => "EquirectangularProjection",
            ProjectionKind::Plane => "ProjectionPlane",
            ProjectionKind::TextureMapped => "TextureMappedProjection",
        }
    }
}

impl Projection {
    pub fn kind(&self) -> ProjectionKind {
        match self {
            Projection::Planar(_) => ProjectionKind::Planar,
            Projection::Fisheye(_) => ProjectionKind::Fisheye,
            Projection::SphericalMirror(_) => ProjectionKind::SphericalMirror,
            Projection::SpoutOutput(_) => ProjectionKind::SpoutOutput,
            Projection::Cylindrical(_) => ProjectionKind::Cylindrical,
            Projection::Equirectangular(_) => ProjectionKind::Equirectangular,
            Projection::Plane(_) => ProjectionKind::Plane,
            Projection::TextureMapped(_) => ProjectionKind::TextureMapped,
        }
    }
}

/// Frustum angles in degrees.
///
/// A symmetric frustum uses `hfov`/`vfov`; an asymmetric one keeps the four
/// edge angles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Fov {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hfov: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vfov: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PlanarProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<Fov>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
}

/// Normalized crop rectangle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Crop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Color {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FisheyeProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepaspectratio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

/// Mesh files for each face of a spherical mirror dome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MirrorGeometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SphericalMirrorProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<MirrorGeometry>,
}

/// Cube map faces that are rendered for a Spout output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SpoutChannels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zleft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zright: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SpoutOutputProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappingspoutname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<SpoutChannels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CylindricalProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heightoffset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EquirectangularProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
}

/// A flat projection surface spanned by three of its corners.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProjectionPlane {
    pub lowerleft: Vec3,
    pub upperleft: Vec3,
    pub upperright: Vec3,
}
