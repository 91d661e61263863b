#![allow(dead_code)]

use llamacs::core::codec::{read_frame, write_value};
use llamacs::core::message::Message;
use llamacs::core::sexp;
use llamacs::Value;
use tokio::net::TcpStream;

/// Minimal EPC peer for driving a server from tests.
pub struct TestClient {
    stream: TcpStream,
    next_uid: i64,
}

impl TestClient {
    pub async fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect to server");
        Self {
            stream,
            next_uid: 1,
        }
    }

    pub async fn send(&mut self, message: Message) {
        write_value(&mut self.stream, &message.into_value())
            .await
            .expect("send message");
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        use tokio::io::AsyncWriteExt;
        self.stream.write_all(bytes).await.expect("send raw bytes");
    }

    pub async fn receive(&mut self) -> Message {
        let payload = read_frame(&mut self.stream)
            .await
            .expect("read reply")
            .expect("server closed the connection");
        let value = sexp::parse(&payload).expect("reply parses");
        Message::from_value(&value).expect("reply is a message")
    }

    pub async fn call(&mut self, method: &str, args: Vec<Value>) -> Message {
        let uid = Value::Integer(self.next_uid);
        self.next_uid += 1;
        self.send(Message::Call {
            uid: uid.clone(),
            method: method.to_string(),
            args,
        })
        .await;
        let reply = self.receive().await;
        assert_eq!(reply.uid(), &uid, "reply uid matches call");
        reply
    }

    pub async fn query(&mut self, a: &str) -> Value {
        match self.call("query", vec![Value::string(a)]).await {
            Message::Return { value, .. } => value,
            other => panic!("expected return, got {other:?}"),
        }
    }
}
