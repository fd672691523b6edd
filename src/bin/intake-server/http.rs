//! Minimal HTTP/1.1 framing for the intake server

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Request line plus headers
const MAX_HEAD_BYTES: usize = 16 * 1024;
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection closed before a request arrived")]
    Closed,
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("request exceeds {0} bytes")]
    TooLarge(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub body: Vec<u8>,
}

/// Read one request. Only `Content-Length` bodies are supported.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head_bytes = 0;
    let request_line = read_head_line(reader, &mut head_bytes).await?;
    if request_line.is_empty() {
        return Err(HttpError::Closed);
    }

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(_version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::Malformed(request_line));
    };
    let path = target.split('?').next().unwrap_or_default().to_string();
    let method = method.to_ascii_uppercase();

    let mut content_length = 0;
    loop {
        let line = read_head_line(reader, &mut head_bytes).await?;
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(HttpError::Malformed(line));
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value
                .trim()
                .parse()
                .map_err(|_| HttpError::Malformed(format!("bad content length {value:?}")))?;
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(HttpError::TooLarge(MAX_BODY_BYTES));
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Request { method, path, body })
}

/// One head line with its line ending stripped; empty at end of headers or EOF
async fn read_head_line<R>(reader: &mut R, head_bytes: &mut usize) -> Result<String, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader.read_line(&mut line).await?;
    *head_bytes += read;
    if *head_bytes > MAX_HEAD_BYTES {
        return Err(HttpError::TooLarge(MAX_HEAD_BYTES));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// JSON reply, or an empty one for preflight
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl Response {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let body = match &self.body {
            Some(value) => serde_json::to_vec(value)?,
            None => Vec::new(),
        };
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n",
            self.status,
            reason(self.status),
            body.len()
        );
        if self.body.is_some() {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str("\r\n");

        writer.write_all(head.as_bytes()).await?;
        writer.write_all(&body).await?;
        writer.flush().await
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        _ => "Internal Server Error",
    }
}
