//! Serde view of the Lottie subset the CPU engine draws. Unknown keys are
//! ignored; unknown shape kinds deserialize as [`ShapeDef::Unsupported`].

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct LottieDef {
    pub fr: f64,
    pub ip: f64,
    pub op: f64,
    pub w: f64,
    pub h: f64,
    pub layers: Vec<LayerDef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LayerDef {
    pub ty: i64,
    #[serde(default)]
    pub ind: Option<i64>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub ip: Option<f64>,
    #[serde(default)]
    pub op: Option<f64>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub ks: TransformDef,
    #[serde(default)]
    pub shapes: Vec<ShapeDef>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransformDef {
    #[serde(default)]
    pub a: Option<PropertyDef>,
    #[serde(default)]
    pub p: Option<PositionDef>,
    #[serde(default)]
    pub s: Option<PropertyDef>,
    #[serde(default)]
    pub r: Option<PropertyDef>,
    #[serde(default)]
    pub o: Option<PropertyDef>,
}

/// An animatable property; `k` is a value or a keyframe list.
#[derive(Debug, Deserialize)]
pub(crate) struct PropertyDef {
    pub k: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PositionDef {
    Split { x: PropertyDef, y: PropertyDef },
    Unified(PropertyDef),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "ty")]
pub(crate) enum ShapeDef {
    #[serde(rename = "gr")]
    Group {
        #[serde(default)]
        it: Vec<ShapeDef>,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "rc")]
    Rect {
        p: PropertyDef,
        s: PropertyDef,
        #[serde(default)]
        r: Option<PropertyDef>,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "el")]
    Ellipse {
        p: PropertyDef,
        s: PropertyDef,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "sh")]
    Path {
        ks: PropertyDef,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "fl")]
    Fill {
        c: PropertyDef,
        #[serde(default)]
        o: Option<PropertyDef>,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "st")]
    Stroke {
        c: PropertyDef,
        #[serde(default)]
        o: Option<PropertyDef>,
        w: PropertyDef,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "tr")]
    Transform(TransformDef),
    #[serde(other)]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_shapes_and_keys_are_tolerated() {
        let shapes: Vec<ShapeDef> = serde_json::from_value(json!([
            {"ty": "gr", "nm": "g", "it": [
                {"ty": "rc", "p": {"k": [0, 0]}, "s": {"k": [10, 10]}},
                {"ty": "gf", "whatever": 1},
                {"ty": "tr", "p": {"a": 0, "k": [5, 5]}, "sk": {"k": 0}}
            ]},
            {"ty": "mm", "mm": 1}
        ]))
        .unwrap();
        let ShapeDef::Group { it, .. } = &shapes[0] else {
            panic!("expected group");
        };
        assert!(matches!(it[0], ShapeDef::Rect { .. }));
        assert!(matches!(it[1], ShapeDef::Unsupported));
        assert!(matches!(it[2], ShapeDef::Transform(_)));
        assert!(matches!(shapes[1], ShapeDef::Unsupported));
    }

    #[test]
    fn split_and_unified_positions() {
        let split: PositionDef =
            serde_json::from_value(json!({"s": true, "x": {"k": 1}, "y": {"k": 2}})).unwrap();
        assert!(matches!(split, PositionDef::Split { .. }));
        let unified: PositionDef = serde_json::from_value(json!({"a": 0, "k": [1, 2]})).unwrap();
        assert!(matches!(unified, PositionDef::Unified(_)));
    }

    #[test]
    fn missing_required_fields_fail() {
        assert!(serde_json::from_value::<LottieDef>(json!({"w": 10, "h": 10})).is_err());
    }
}
