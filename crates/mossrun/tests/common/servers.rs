//! Minimal stand-ins for the MOSS submission server and its report pages.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// How the fake MOSS server treats one connection.
#[derive(Debug, Clone)]
pub enum Session {
    /// Closes the connection before answering `language`.
    Drop,
    /// Answers `no` to `language`.
    RejectLanguage,
    /// Accepts everything and answers `query` with the given line.
    Answer(String),
}

/// Upload headers (`file <id> <lang> <size> <name>`) seen per session.
pub type Uploads = Arc<Mutex<Vec<Vec<String>>>>;

/// Serves one connection per scripted session, in order. Returns the port
/// and the uploads recorded so far.
pub fn fake_moss(sessions: Vec<Session>) -> (u16, Uploads) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let uploads: Uploads = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&uploads);

    thread::spawn(move || {
        for session in sessions {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let mut files = Vec::new();

            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let line = line.trim_end().to_string();

                if line.starts_with("language ") {
                    match &session {
                        Session::Drop => break,
                        Session::RejectLanguage => {
                            let _ = writer.write_all(b"no\n");
                            break;
                        }
                        Session::Answer(_) => {
                            let _ = writer.write_all(b"yes\n");
                        }
                    }
                } else if line.starts_with("file ") {
                    let size: usize = line.split(' ').nth(3).unwrap().parse().unwrap();
                    let mut content = vec![0u8; size];
                    reader.read_exact(&mut content).unwrap();
                    files.push(line);
                } else if line.starts_with("query ") {
                    if let Session::Answer(answer) = &session {
                        let _ = writer.write_all(format!("{}\n", answer).as_bytes());
                    }
                } else if line == "end" {
                    break;
                }
            }
            recorded.lock().unwrap().push(files);
        }
    });

    (port, uploads)
}

/// Waits until the fake server has closed `count` sessions and returns them.
pub fn wait_for_sessions(uploads: &Uploads, count: usize) -> Vec<Vec<String>> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let sessions = uploads.lock().unwrap().clone();
        if sessions.len() >= count || Instant::now() > deadline {
            assert_eq!(sessions.len(), count, "fake MOSS server sessions");
            return sessions;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// Serves fixed pages by path over HTTP/1.1 until the test process exits.
/// Returns the base address, e.g. `http://127.0.0.1:40123`.
pub fn serve_pages(pages: HashMap<String, String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
                    break;
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = match pages.get(path) {
                Some(body) => ("200 OK", body.clone()),
                None => ("404 Not Found", "not found".to_string()),
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", addr)
}

/// Report index listing `(first, first%, second, second%, lines)` rows,
/// linked as `match0.html`, `match1.html`, ...
pub fn index_page(rows: &[(&str, u32, &str, u32, u32)]) -> String {
    let mut html = String::from(
        "<HTML><HEAD><TITLE>Moss Results</TITLE></HEAD><BODY>\nMoss Results<p>\n<TABLE>\n<TR><TH>File 1<TH>File 2<TH>Lines Matched\n",
    );
    for (i, (first, first_pct, second, second_pct, lines)) in rows.iter().enumerate() {
        html.push_str(&format!(
            "<TR><TD><A HREF=\"match{i}.html\">{first} ({first_pct}%)</A>\n    <TD><A HREF=\"match{i}.html\">{second} ({second_pct}%)</A>\n<TD ALIGN=right>{lines}\n"
        ));
    }
    html.push_str("</TABLE>\n</BODY></HTML>");
    html
}

/// Match overview page with one row per `(first, second)` line range pair.
pub fn top_page(ranges: &[((u32, u32), (u32, u32))]) -> String {
    let mut html = String::from(
        "<HTML><BODY><TABLE>\n<TR><TH>a.py (1%)<TH><TH>b.py (1%)<TH>\n",
    );
    for ((a, b), (c, d)) in ranges {
        html.push_str(&format!(
            "<TR><TD><A HREF=\"m-0.html#0\">{a}-{b}</A>\n    <TD>\n    <TD><A HREF=\"m-1.html#0\">{c}-{d}</A>\n<TD>\n"
        ));
    }
    html.push_str("</TABLE></BODY></HTML>");
    html
}
