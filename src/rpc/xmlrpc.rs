//! XML-RPC document codec.
//!
//! Requests are rendered directly into a string. Responses are read into a
//! small element tree with `quick-xml` and then interpreted, which keeps the
//! value decoding a plain recursive walk.
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use serde_json::{Map, Number};

use crate::error::RpcError;

use super::Value;

const XML_DECL: &str = "<?xml version=\"1.0\"?>";

pub(crate) fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECL);
    out.push_str("<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(param, &mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn encode_value(value: &Value, out: &mut String) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(flag) => {
            out.push_str(if *flag {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Number(number) => encode_number(number, out),
        Value::String(text) => {
            out.push_str("<string>");
            out.push_str(&escape(text.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(item, out);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(member, out);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

fn encode_number(number: &Number, out: &mut String) {
    if let Some(int) = number.as_i64() {
        let tag = if i32::try_from(int).is_ok() { "int" } else { "i8" };
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(&int.to_string());
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    } else {
        out.push_str("<double>");
        out.push_str(&number.to_string());
        out.push_str("</double>");
    }
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn require(&self, name: &str) -> Result<&Element, RpcError> {
        self.child(name).ok_or_else(|| {
            RpcError::malformed(format!("<{}> is missing <{}>", self.name, name))
        })
    }
}

/// Decodes a `methodResponse` document into its single result value.
///
/// # Errors
///
/// Returns [`RpcError::Fault`] for `<fault>` responses and
/// [`RpcError::Malformed`] for anything that is not a well-formed response.
pub(crate) fn decode_response(body: &str) -> Result<Value, RpcError> {
    let root = parse_tree(body)?;
    if root.name != "methodResponse" {
        return Err(RpcError::malformed(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }
    if let Some(fault) = root.child("fault") {
        return Err(decode_fault(fault));
    }
    let value = root.require("params")?.require("param")?.require("value")?;
    decode_value(value)
}

fn decode_fault(fault: &Element) -> RpcError {
    let detail = match fault.require("value").and_then(decode_value) {
        Ok(detail) => detail,
        Err(err) => return err,
    };
    let code = detail
        .get("faultCode")
        .and_then(Value::as_i64)
        .unwrap_or_default();
    let message = detail
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    RpcError::Fault { code, message }
}

fn decode_value(value: &Element) -> Result<Value, RpcError> {
    let Some(typed) = value.children.first() else {
        return Ok(Value::String(value.text.clone()));
    };
    let text = typed.text.trim();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|err| RpcError::malformed(format!("bad integer '{}': {}", text, err))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(RpcError::malformed(format!("bad boolean '{}'", other))),
        },
        "double" => {
            let parsed = text
                .parse::<f64>()
                .map_err(|err| RpcError::malformed(format!("bad double '{}': {}", text, err)))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| RpcError::malformed(format!("non-finite double '{}'", text)))
        }
        "string" => Ok(Value::String(typed.text.clone())),
        "dateTime.iso8601" | "base64" => Ok(Value::String(text.to_owned())),
        "nil" => Ok(Value::Null),
        "array" => typed
            .require("data")?
            .children
            .iter()
            .filter(|item| item.name == "value")
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "struct" => {
            let mut members = Map::new();
            for member in typed.children.iter().filter(|item| item.name == "member") {
                let name = member.require("name")?.text.clone();
                let decoded = decode_value(member.require("value")?)?;
                members.insert(name, decoded);
            }
            Ok(Value::Object(members))
        }
        other => Err(RpcError::malformed(format!("unknown value type <{}>", other))),
    }
}

fn parse_tree(body: &str) -> Result<Element, RpcError> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(Element::new(element_name(start.local_name().as_ref())?));
            }
            Ok(Event::Empty(start)) => {
                let element = Element::new(element_name(start.local_name().as_ref())?);
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| RpcError::malformed("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(text)) => {
                let unescaped = text
                    .unescape()
                    .map_err(|err| RpcError::malformed(format!("bad text: {}", err)))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(data)) => {
                let raw = std::str::from_utf8(&data)
                    .map_err(|err| RpcError::malformed(format!("bad CDATA: {}", err)))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(raw);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(RpcError::malformed(format!(
                    "invalid XML at byte {}: {}",
                    reader.buffer_position(),
                    err
                )));
            }
        }
    }

    if !stack.is_empty() {
        return Err(RpcError::malformed("document ended inside an element"));
    }
    root.ok_or_else(|| RpcError::malformed("empty response body"))
}

fn element_name(raw: &[u8]) -> Result<String, RpcError> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|err| RpcError::malformed(format!("bad element name: {}", err)))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), RpcError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(RpcError::malformed("multiple root elements")),
    }
}
