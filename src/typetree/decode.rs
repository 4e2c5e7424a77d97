use linked_hash_map::LinkedHashMap;

use super::reader::Reader;
use super::registry::{AssetFile, ClassRegistry};
use super::{DataKind, Node, Value};
use crate::endian::{DoSwap, Endian, NoSwap, SwapPolicy};
use crate::error::Error;

/// Per-invocation state threaded through one [`read_typetree`] call.
///
/// `has_registry` is the only mutable piece: it guarantees the managed
/// references registry subtree is visited at most once per top-level read,
/// as required by the TypeTree spec's scoping rule.
struct DecodeCtx<'a> {
    as_dict: bool,
    has_registry: bool,
    class_registry: Option<&'a dyn ClassRegistry>,
    asset_file: Option<&'a dyn AssetFile>,
}

/// Walks `root` against `buffer`, returning the decoded value and the number
/// of bytes consumed.
pub fn read_typetree(
    buffer: &[u8],
    root: &Node,
    endian: Endian,
    as_dict: bool,
    asset_file: Option<&dyn AssetFile>,
    classes: Option<&dyn ClassRegistry>,
) -> Result<(Value, usize), Error> {
    let mut reader = Reader::new(buffer);
    let mut ctx = DecodeCtx {
        as_dict,
        has_registry: false,
        class_registry: classes,
        asset_file,
    };

    log::trace!(
        "read_typetree: root={} endian={:?} as_dict={}",
        root.type_name,
        endian,
        as_dict
    );

    let value = if endian.needs_swap() {
        decode_node::<DoSwap>(&mut reader, root, &mut ctx)?
    } else {
        decode_node::<NoSwap>(&mut reader, root, &mut ctx)?
    };

    Ok((value, reader.position()))
}

fn should_align(node: &Node) -> bool {
    node.align() || node.array_child().map(|a| a.align()).unwrap_or(false)
}

fn decode_node<P: SwapPolicy>(
    reader: &mut Reader,
    node: &Node,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    let value = decode_node_value::<P>(reader, node, ctx)?;
    if should_align(node) {
        reader.align4()?;
    }
    Ok(value)
}

fn decode_node_value<P: SwapPolicy>(
    reader: &mut Reader,
    node: &Node,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    use DataKind::*;

    let value = match node.data_kind() {
        U8 => Value::U8(reader.read_u8()?),
        S8 => Value::I8(reader.read_i8()?),
        Bool => Value::Bool(reader.read_bool()?),
        U16 => Value::U16(reader.read_u16::<P>()?),
        S16 => Value::I16(reader.read_i16::<P>()?),
        U32 => Value::U32(reader.read_u32::<P>()?),
        S32 => Value::I32(reader.read_i32::<P>()?),
        U64 => Value::U64(reader.read_u64::<P>()?),
        S64 => Value::I64(reader.read_i64::<P>()?),
        F32 => Value::F32(reader.read_f32::<P>()?),
        F64 => Value::F64(reader.read_f64::<P>()?),
        Str => Value::Str(reader.read_length_prefixed_str::<P>()?),
        Bytes => Value::Bytes(reader.read_length_prefixed_bytes::<P>()?),
        Pair => decode_pair::<P>(reader, node, ctx)?,
        ManagedReferencesRegistry => {
            if ctx.has_registry {
                log::debug!("managed references registry already visited this invocation, skipping");
                return Ok(Value::None);
            }
            ctx.has_registry = true;
            decode_container::<P>(reader, node, ctx)?
        }
        ReferencedObjectData => {
            return Err(Error::schema(
                reader.position(),
                &node.type_name,
                "ReferencedObjectData reached outside of its parent class; cannot resolve without sibling class/ns/asm fields",
            ));
        }
        Array => {
            return Err(Error::schema(
                reader.position(),
                &node.type_name,
                "Array node read directly; it should only appear as a container's first child",
            ));
        }
        PPtr | ReferencedObject | Unk => decode_container::<P>(reader, node, ctx)?,
    };

    Ok(value)
}

fn decode_pair<P: SwapPolicy>(
    reader: &mut Reader,
    node: &Node,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    if node.children.len() != 2 {
        return Err(Error::schema(
            reader.position(),
            &node.type_name,
            format!("pair node must have exactly 2 children, found {}", node.children.len()),
        ));
    }
    let key = decode_node::<P>(reader, &node.children[0], ctx)?;
    let val = decode_node::<P>(reader, &node.children[1], ctx)?;
    Ok(Value::Pair(Box::new(key), Box::new(val)))
}

fn decode_container<P: SwapPolicy>(
    reader: &mut Reader,
    node: &Node,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    if let Some(arr) = node.array_child() {
        decode_array::<P>(reader, arr, ctx)
    } else {
        decode_class::<P>(reader, node, ctx)
    }
}

/// The fast vector path (bulk typed reads, no per-element schema dispatch)
/// versus the generic recursive path, selected once per array by the
/// element's `DataKind`.
fn decode_array<P: SwapPolicy>(
    reader: &mut Reader,
    arr_node: &Node,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    let len = reader.read_i32::<P>()?;
    if len < 0 {
        return Err(Error::argument(format!("negative array length {len}")));
    }
    let len = len as usize;

    let element = arr_node.children.get(1).ok_or_else(|| {
        Error::schema(
            reader.position(),
            &arr_node.type_name,
            "Array node missing element child",
        )
    })?;

    let values = match element.data_kind() {
        DataKind::U8 => (0..len)
            .map(|_| reader.read_u8().map(Value::U8))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::S8 => (0..len)
            .map(|_| reader.read_i8().map(Value::I8))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::Bool => (0..len)
            .map(|_| reader.read_bool().map(Value::Bool))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::U16 => (0..len)
            .map(|_| reader.read_u16::<P>().map(Value::U16))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::S16 => (0..len)
            .map(|_| reader.read_i16::<P>().map(Value::I16))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::U32 => (0..len)
            .map(|_| reader.read_u32::<P>().map(Value::U32))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::S32 => (0..len)
            .map(|_| reader.read_i32::<P>().map(Value::I32))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::U64 => (0..len)
            .map(|_| reader.read_u64::<P>().map(Value::U64))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::S64 => (0..len)
            .map(|_| reader.read_i64::<P>().map(Value::I64))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::F32 => (0..len)
            .map(|_| reader.read_f32::<P>().map(Value::F32))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::F64 => (0..len)
            .map(|_| reader.read_f64::<P>().map(Value::F64))
            .collect::<Result<Vec<_>, _>>()?,
        DataKind::Pair => (0..len)
            .map(|_| decode_pair::<P>(reader, element, ctx))
            .collect::<Result<Vec<_>, _>>()?,
        _ => (0..len)
            .map(|_| decode_node::<P>(reader, element, ctx))
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(Value::Array(values))
}

fn decode_class<P: SwapPolicy>(
    reader: &mut Reader,
    node: &Node,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    let mut fields = LinkedHashMap::new();

    for child in &node.children {
        let value = if child.data_kind() == DataKind::ReferencedObjectData {
            decode_referenced_object_data::<P>(reader, child, &fields, ctx)?
        } else {
            decode_node::<P>(reader, child, ctx)?
        };

        // An unresolved reference (empty class name) or an already-visited
        // managed references registry decodes to `Value::None` as a pure
        // skip signal; the original never calls `PyDict_SetItem` for either
        // case, so the key must not appear in the map at all.
        if !matches!(value, Value::None) {
            fields.insert(child.clean_name().to_string(), value);
        }
    }

    if ctx.as_dict {
        Ok(Value::Map(fields))
    } else {
        Ok(materialize_instance(node, fields, ctx))
    }
}

fn decode_referenced_object_data<P: SwapPolicy>(
    reader: &mut Reader,
    node: &Node,
    partial: &LinkedHashMap<String, Value>,
    ctx: &mut DecodeCtx,
) -> Result<Value, Error> {
    let type_fields = partial.get("type").and_then(Value::as_map);
    let class = type_fields
        .and_then(|m| m.get("class"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let namespace = type_fields
        .and_then(|m| m.get("ns"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let assembly = type_fields
        .and_then(|m| m.get("asm"))
        .and_then(Value::as_str)
        .unwrap_or("");

    if class.is_empty() {
        log::debug!("referenced object data has empty class name, skipping");
        return Ok(Value::None);
    }

    let asset_file = ctx.asset_file.ok_or_else(|| {
        Error::resolution(format!(
            "no asset file supplied to resolve referenced type {class} (ns={namespace}, asm={assembly})"
        ))
    })?;

    let target = asset_file
        .resolve_ref_type(class, namespace, assembly)
        .ok_or_else(|| {
            Error::resolution(format!(
                "unresolved reference type ({class}, {namespace}, {assembly})"
            ))
        })?;

    decode_node::<P>(reader, &target, ctx)
}

fn materialize_instance(node: &Node, fields: LinkedHashMap<String, Value>, ctx: &DecodeCtx) -> Value {
    let registry = match ctx.class_registry {
        Some(r) => r,
        None => return Value::Map(fields),
    };

    let class_name: &str = match node.data_kind() {
        DataKind::PPtr => "PPtr",
        _ => node.type_name.as_str(),
    };

    if let Ok(instance) = registry.try_construct(class_name, &fields, ctx.asset_file) {
        return Value::Instance(instance);
    }

    if let Some(declared) = registry.declared_attrs(class_name) {
        let mut accepted = LinkedHashMap::new();
        let mut extra = LinkedHashMap::new();
        for (k, v) in fields.into_iter() {
            if declared.iter().any(|d| d == &k) {
                accepted.insert(k, v);
            } else {
                extra.insert(k, v);
            }
        }

        match registry.try_construct(class_name, &accepted, ctx.asset_file) {
            Ok(mut instance) => {
                for (k, v) in extra {
                    if registry.set_attr(&mut instance, &k, v).is_err() {
                        log::warn!("failed to set extra attribute {k} on {class_name}");
                    }
                }
                return Value::Instance(instance);
            }
            Err(err) => {
                log::warn!("falling back to unknown object for {class_name}: {err}");
                let mut merged = accepted;
                for (k, v) in extra {
                    merged.insert(k, v);
                }
                return Value::Instance(registry.unknown_object(node, merged));
            }
        }
    }

    Value::Instance(registry.unknown_object(node, fields))
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    crate::init_test_logger!();
}
