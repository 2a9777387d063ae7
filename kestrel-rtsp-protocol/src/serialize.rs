use bytes::{BufMut, Bytes, BytesMut};

use super::{message::Headers, request::Request, response::Response};

/// Line terminator used when writing a message.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum LineEnding {
    Lf,
    #[default]
    CrLf,
}

impl LineEnding {
    const fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

pub trait Serialize {
    fn serialize(&self, dst: &mut BytesMut, ending: LineEnding);

    fn to_bytes(&self, ending: LineEnding) -> Bytes {
        let mut dst = BytesMut::new();
        self.serialize(&mut dst, ending);
        dst.freeze()
    }
}

impl Serialize for Request {
    fn serialize(&self, dst: &mut BytesMut, ending: LineEnding) {
        dst.put(format!("{} {} {}", self.method, self.uri, self.version).as_bytes());
        dst.put(ending.as_bytes());
        put_cseq(dst, Some(self.cseq), ending);
        put_headers_and_body(dst, &self.headers, self.body.as_ref(), ending);
    }
}

impl Serialize for Response {
    fn serialize(&self, dst: &mut BytesMut, ending: LineEnding) {
        debug_assert!(
            self.body.as_ref().map_or(true, |body| body.is_empty()
                || self.headers.get("Content-Length") == Some(body.len().to_string().as_str())),
            "response body without matching Content-Length",
        );

        dst.put(format!("{} {} {}", self.version, self.status, self.reason).as_bytes());
        dst.put(ending.as_bytes());
        put_cseq(dst, self.cseq, ending);
        put_headers_and_body(dst, &self.headers, self.body.as_ref(), ending);
    }
}

fn put_cseq(dst: &mut BytesMut, cseq: Option<i64>, ending: LineEnding) {
    if let Some(cseq) = cseq {
        dst.put(format!("CSeq: {cseq}").as_bytes());
        dst.put(ending.as_bytes());
    }
}

fn put_headers_and_body(
    dst: &mut BytesMut,
    headers: &Headers,
    body: Option<&Bytes>,
    ending: LineEnding,
) {
    // CSeq always goes first and is written from the message field.
    for (var, val) in headers
        .iter()
        .filter(|(var, _)| !var.eq_ignore_ascii_case("CSeq"))
    {
        dst.put(format!("{var}: {val}").as_bytes());
        dst.put(ending.as_bytes());
    }

    dst.put(ending.as_bytes());

    if let Some(body) = body {
        dst.put(body.as_ref());
    }
}
