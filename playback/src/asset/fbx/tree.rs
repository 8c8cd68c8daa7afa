use std::io::Cursor;

use fbxcel::low::v7400::AttributeValue;
use fbxcel::tree::any::AnyTree;
use fbxcel::tree::v7400::NodeHandle;

use crate::error::ParseError;

/// Oldest binary layout the tree parser understands.
/// Oldest `(major, minor)` release with the 7.x object/connection layout.
const MIN_FBX_VERSION: (u32, u32) = (7, 1);

/// Owned copy of one FBX node attribute.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FbxValue {
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    ArrBool(Vec<bool>),
    ArrI32(Vec<i32>),
    ArrI64(Vec<i64>),
    ArrF32(Vec<f32>),
    ArrF64(Vec<f64>),
    String(String),
    Binary(Vec<u8>),
}

impl FbxValue {
    pub(crate) fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v.into()),
            Self::F64(v) => Some(v),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Self::ArrF64(v) => Some(v.clone()),
            Self::ArrF32(v) => Some(v.iter().map(|&x| x.into()).collect()),
            _ => None,
        }
    }

    pub(crate) fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            Self::ArrI32(v) => Some(v.iter().map(|&x| x.into()).collect()),
            Self::ArrI64(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl From<&AttributeValue> for FbxValue {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Bool(v) => Self::Bool(*v),
            AttributeValue::I16(v) => Self::I16(*v),
            AttributeValue::I32(v) => Self::I32(*v),
            AttributeValue::I64(v) => Self::I64(*v),
            AttributeValue::F32(v) => Self::F32(*v),
            AttributeValue::F64(v) => Self::F64(*v),
            AttributeValue::ArrBool(v) => Self::ArrBool(v.clone()),
            AttributeValue::ArrI32(v) => Self::ArrI32(v.clone()),
            AttributeValue::ArrI64(v) => Self::ArrI64(v.clone()),
            AttributeValue::ArrF32(v) => Self::ArrF32(v.clone()),
            AttributeValue::ArrF64(v) => Self::ArrF64(v.clone()),
            AttributeValue::String(v) => Self::String(v.clone()),
            AttributeValue::Binary(v) => Self::Binary(v.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FbxNode {
    pub name: String,
    pub attrs: Vec<FbxValue>,
    pub children: Vec<FbxNode>,
}

impl FbxNode {
    pub(crate) fn new(name: &str, attrs: Vec<FbxValue>, children: Vec<FbxNode>) -> Self {
        Self {
            name: name.to_string(),
            attrs,
            children,
        }
    }

    pub(crate) fn child(&self, name: &str) -> Option<&FbxNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub(crate) fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a FbxNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub(crate) fn attr(&self, index: usize) -> Option<&FbxValue> {
        self.attrs.get(index)
    }

    /// First attribute of the named child, as a float array.
    pub(crate) fn f64_array(&self, child: &str) -> Option<Vec<f64>> {
        self.child(child)?.attr(0)?.to_f64_vec()
    }

    pub(crate) fn i64_array(&self, child: &str) -> Option<Vec<i64>> {
        self.child(child)?.attr(0)?.to_i64_vec()
    }

    /// Values of a `Properties70/P` entry, past its four descriptor fields.
    pub(crate) fn property(&self, name: &str) -> Option<&[FbxValue]> {
        self.child("Properties70")?
            .children_named("P")
            .find(|p| p.attr(0).and_then(FbxValue::as_str) == Some(name))
            .map(|p| p.attrs.get(4..).unwrap_or_default())
    }
}

/// Parses a binary FBX document into an owned tree rooted at an unnamed node.
pub(crate) fn parse_document(bytes: &[u8]) -> Result<FbxNode, ParseError> {
    let tree = AnyTree::from_seekable_reader(Cursor::new(bytes))
        .map_err(|err| ParseError::Fbx(err.to_string()))?;
    match tree {
        AnyTree::V7400(version, tree, _footer) => {
            check_version(version.major_minor())?;
            Ok(FbxNode {
                name: String::new(),
                attrs: Vec::new(),
                children: tree.root().children().map(convert).collect(),
            })
        }
        _ => Err(ParseError::Fbx("unsupported FBX tree layout".to_string())),
    }
}

fn check_version((major, minor): (u32, u32)) -> Result<(), ParseError> {
    if (major, minor) < MIN_FBX_VERSION {
        return Err(ParseError::UnsupportedFbxVersion { major, minor });
    }
    Ok(())
}

fn convert(handle: NodeHandle<'_>) -> FbxNode {
    FbxNode {
        name: handle.name().to_string(),
        attrs: handle.attributes().iter().map(FbxValue::from).collect(),
        children: handle.children().map(convert).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str, values: Vec<FbxValue>) -> FbxNode {
        let mut attrs = vec![
            FbxValue::String(name.to_string()),
            FbxValue::String(String::new()),
            FbxValue::String(String::new()),
            FbxValue::String(String::new()),
        ];
        attrs.extend(values);
        FbxNode::new("P", attrs, Vec::new())
    }

    #[test]
    fn properties70_values_skip_descriptors() {
        let model = FbxNode::new(
            "Model",
            Vec::new(),
            vec![FbxNode::new(
                "Properties70",
                Vec::new(),
                vec![p(
                    "Lcl Translation",
                    vec![FbxValue::F64(1.0), FbxValue::F64(2.0), FbxValue::F64(3.0)],
                )],
            )],
        );
        let values = model.property("Lcl Translation").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[2].as_f64(), Some(3.0));
        assert!(model.property("Lcl Rotation").is_none());
    }

    #[test]
    fn array_accessors_widen_element_types() {
        let geometry = FbxNode::new(
            "Geometry",
            Vec::new(),
            vec![
                FbxNode::new("Vertices", vec![FbxValue::ArrF32(vec![0.5, 1.5])], Vec::new()),
                FbxNode::new("PolygonVertexIndex", vec![FbxValue::ArrI32(vec![0, -2])], Vec::new()),
            ],
        );
        assert_eq!(geometry.f64_array("Vertices"), Some(vec![0.5, 1.5]));
        assert_eq!(geometry.i64_array("PolygonVertexIndex"), Some(vec![0, -2]));
    }

    #[test]
    fn non_fbx_bytes_are_rejected() {
        assert!(parse_document(b"not an fbx file at all").is_err());
    }

    #[test]
    fn fbx_versions_below_7_1_are_rejected() {
        assert!(check_version((7, 4)).is_ok());
        assert!(check_version((7, 1)).is_ok());
        let error = check_version((6, 1)).unwrap_err();
        assert!(matches!(
            error,
            ParseError::UnsupportedFbxVersion { major: 6, minor: 1 }
        ));
        assert_eq!(error.to_string(), "unsupported FBX version 6.1");
    }
}
