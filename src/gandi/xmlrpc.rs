//! Minimal XML-RPC codec: method calls out, method responses (or faults) in.
use std::collections::BTreeMap;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::error::{Fault, RpcError};

const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    DateTime(NaiveDateTime),
    Base64(Vec<u8>),
    Struct(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(name),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
    }

    /// Builds a struct value from `(name, value)` pairs.
    pub fn structure<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(i) if i32::try_from(*i).is_ok() => {
                out.push_str(&format!("<int>{i}</int>"));
            }
            Value::Int(i) => out.push_str(&format!("<i8>{i}</i8>")),
            Value::Bool(b) => out.push_str(if *b {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            }),
            Value::String(s) => {
                out.push_str("<string>");
                out.push_str(&escape(s.as_str()));
                out.push_str("</string>");
            }
            Value::Double(d) => out.push_str(&format!("<double>{d}</double>")),
            Value::DateTime(dt) => out.push_str(&format!(
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                dt.format(DATETIME_FORMAT)
            )),
            Value::Base64(bytes) => {
                out.push_str("<base64>");
                out.push_str(&BASE64.encode(bytes));
                out.push_str("</base64>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name.as_str()));
                    out.push_str("</name>");
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.write_xml(out);
                }
                out.push_str("</data></array>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write_xml(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Decodes a `methodResponse`. A `<fault>` comes back as `RpcError::Fault`.
pub fn decode_response(body: &str) -> Result<Value, RpcError> {
    let mut decoder = Decoder::new(body);
    decoder.expect_open("methodResponse")?;
    match decoder.tag()? {
        Tag::Open(name) if name == "params" => {
            decoder.expect_open("param")?;
            let value = decoder.value()?;
            decoder.expect_close("param")?;
            decoder.expect_close("params")?;
            decoder.expect_close("methodResponse")?;
            Ok(value)
        }
        Tag::Open(name) if name == "fault" => {
            let value = decoder.value()?;
            decoder.expect_close("fault")?;
            Err(RpcError::Fault(fault_from_value(&value)?))
        }
        other => Err(RpcError::malformed(format!(
            "expected <params> or <fault>, found {other}"
        ))),
    }
}

fn fault_from_value(value: &Value) -> Result<Fault, RpcError> {
    let code = value
        .member("faultCode")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::malformed("fault without integer faultCode"))?;
    let message = value
        .member("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(Fault::new(code, message))
}

enum Tag {
    Open(String),
    Empty(String),
    Close(String),
    Eof,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Open(name) => write!(f, "<{name}>"),
            Tag::Empty(name) => write!(f, "<{name}/>"),
            Tag::Close(name) => write!(f, "</{name}>"),
            Tag::Eof => f.write_str("end of document"),
        }
    }
}

struct Decoder<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Decoder<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            reader: Reader::from_str(body),
        }
    }

    fn raw(&mut self) -> Result<Event<'a>, RpcError> {
        loop {
            match self.reader.read_event()? {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                event => return Ok(event),
            }
        }
    }

    /// Next structural tag; whitespace between tags is skipped.
    fn tag(&mut self) -> Result<Tag, RpcError> {
        loop {
            match self.raw()? {
                Event::Start(e) => return Ok(Tag::Open(utf8(e.name().as_ref())?)),
                Event::Empty(e) => return Ok(Tag::Empty(utf8(e.name().as_ref())?)),
                Event::End(e) => return Ok(Tag::Close(utf8(e.name().as_ref())?)),
                Event::Eof => return Ok(Tag::Eof),
                Event::Text(t) => {
                    let text = t.unescape()?;
                    if !text.trim().is_empty() {
                        return Err(RpcError::malformed(format!(
                            "unexpected text {:?}",
                            text.trim()
                        )));
                    }
                }
                _ => continue,
            }
        }
    }

    fn expect_open(&mut self, name: &str) -> Result<(), RpcError> {
        match self.tag()? {
            Tag::Open(found) if found == name => Ok(()),
            other => Err(RpcError::malformed(format!(
                "expected <{name}>, found {other}"
            ))),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<(), RpcError> {
        match self.tag()? {
            Tag::Close(found) if found == name => Ok(()),
            other => Err(RpcError::malformed(format!(
                "expected </{name}>, found {other}"
            ))),
        }
    }

    fn value(&mut self) -> Result<Value, RpcError> {
        match self.tag()? {
            Tag::Open(name) if name == "value" => self.value_body(),
            Tag::Empty(name) if name == "value" => Ok(Value::String(String::new())),
            other => Err(RpcError::malformed(format!(
                "expected <value>, found {other}"
            ))),
        }
    }

    /// Content of a `<value>` after its opening tag, up to and including `</value>`.
    fn value_body(&mut self) -> Result<Value, RpcError> {
        let mut text = String::new();
        loop {
            match self.raw()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&utf8(&c.into_inner())?),
                Event::Start(e) => {
                    let name = utf8(e.name().as_ref())?;
                    let value = self.typed(&name)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                Event::Empty(e) => {
                    let name = utf8(e.name().as_ref())?;
                    let value = empty_typed(&name)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                Event::End(e) if e.name().as_ref() == b"value" => {
                    // untyped values are strings
                    return Ok(Value::String(text));
                }
                Event::End(e) => {
                    return Err(RpcError::malformed(format!(
                        "unexpected </{}> inside <value>",
                        utf8(e.name().as_ref())?
                    )));
                }
                Event::Eof => return Err(RpcError::malformed("unterminated <value>")),
                _ => continue,
            }
        }
    }

    fn typed(&mut self, name: &str) -> Result<Value, RpcError> {
        match name {
            "i4" | "int" | "i8" => {
                let text = self.leaf_text(name)?;
                text.trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| RpcError::malformed(format!("invalid integer {text:?}")))
            }
            "boolean" => match self.leaf_text(name)?.trim() {
                "1" | "true" => Ok(Value::Bool(true)),
                "0" | "false" => Ok(Value::Bool(false)),
                other => Err(RpcError::malformed(format!("invalid boolean {other:?}"))),
            },
            "string" => Ok(Value::String(self.leaf_text(name)?)),
            "double" => {
                let text = self.leaf_text(name)?;
                text.trim()
                    .parse()
                    .map(Value::Double)
                    .map_err(|_| RpcError::malformed(format!("invalid double {text:?}")))
            }
            "dateTime.iso8601" => {
                let text = self.leaf_text(name)?;
                parse_datetime(text.trim()).map(Value::DateTime)
            }
            "base64" => {
                let text = self.leaf_text(name)?;
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                BASE64
                    .decode(compact)
                    .map(Value::Base64)
                    .map_err(|err| RpcError::malformed(format!("invalid base64: {err}")))
            }
            "nil" => {
                self.expect_close("nil")?;
                Ok(Value::Nil)
            }
            "struct" => self.structure(),
            "array" => self.array(),
            other => Err(RpcError::malformed(format!("unknown value type <{other}>"))),
        }
    }

    fn leaf_text(&mut self, name: &str) -> Result<String, RpcError> {
        let mut text = String::new();
        loop {
            match self.raw()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&utf8(&c.into_inner())?),
                Event::End(e) if e.name().as_ref() == name.as_bytes() => return Ok(text),
                Event::Eof => {
                    return Err(RpcError::malformed(format!("unterminated <{name}>")));
                }
                _ => {
                    return Err(RpcError::malformed(format!(
                        "unexpected markup inside <{name}>"
                    )));
                }
            }
        }
    }

    fn structure(&mut self) -> Result<Value, RpcError> {
        let mut members = BTreeMap::new();
        loop {
            match self.tag()? {
                Tag::Open(name) if name == "member" => {
                    self.expect_open("name")?;
                    let key = self.leaf_text("name")?;
                    let value = self.value()?;
                    self.expect_close("member")?;
                    members.insert(key, value);
                }
                Tag::Close(name) if name == "struct" => return Ok(Value::Struct(members)),
                other => {
                    return Err(RpcError::malformed(format!(
                        "expected <member>, found {other}"
                    )));
                }
            }
        }
    }

    fn array(&mut self) -> Result<Value, RpcError> {
        let mut items = Vec::new();
        match self.tag()? {
            Tag::Open(name) if name == "data" => loop {
                match self.tag()? {
                    Tag::Open(name) if name == "value" => items.push(self.value_body()?),
                    Tag::Empty(name) if name == "value" => items.push(Value::String(String::new())),
                    Tag::Close(name) if name == "data" => break,
                    other => {
                        return Err(RpcError::malformed(format!(
                            "expected <value>, found {other}"
                        )));
                    }
                }
            },
            Tag::Empty(name) if name == "data" => {}
            other => {
                return Err(RpcError::malformed(format!(
                    "expected <data>, found {other}"
                )));
            }
        }
        self.expect_close("array")?;
        Ok(Value::Array(items))
    }
}

fn empty_typed(name: &str) -> Result<Value, RpcError> {
    match name {
        "string" => Ok(Value::String(String::new())),
        "nil" => Ok(Value::Nil),
        "struct" => Ok(Value::Struct(BTreeMap::new())),
        "array" => Ok(Value::Array(Vec::new())),
        other => Err(RpcError::malformed(format!("empty <{other}/> has no value"))),
    }
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, RpcError> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| RpcError::malformed(format!("invalid dateTime {text:?}")))
}

fn utf8(bytes: &[u8]) -> Result<String, RpcError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| RpcError::malformed("invalid UTF-8"))
}
