use std::sync::Arc;

fn start_server(port: u16) -> tokio::task::JoinHandle<()> {
    let config = bitis::config::Config {
        port,
        ..Default::default()
    };
    let config = Arc::new(config);
    let store = Arc::new(bitis::store::Keyspace::new());

    tokio::spawn(async move {
        let _ = bitis::server::run_server(store, config).await;
    })
}

fn get_client(port: u16) -> redis::Connection {
    let client = redis::Client::open(format!("redis://127.0.0.1:{port}/")).unwrap();
    // Retry connection a few times
    for i in 0..50 {
        match client.get_connection() {
            Ok(conn) => return conn,
            Err(_) if i < 49 => {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            Err(e) => panic!("Failed to connect: {e}"),
        }
    }
    unreachable!()
}

async fn with_client<F>(port: u16, body: F)
where
    F: FnOnce(&mut redis::Connection) + Send + 'static,
{
    let _server = start_server(port);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    tokio::task::spawn_blocking(move || {
        let mut conn = get_client(port);
        body(&mut conn);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_ping_echo() {
    with_client(17400, |conn| {
        let result: String = redis::cmd("PING").query(conn).unwrap();
        assert_eq!(result, "PONG");
        let result: String = redis::cmd("ECHO").arg("hello").query(conn).unwrap();
        assert_eq!(result, "hello");
    })
    .await;
}

#[tokio::test]
async fn test_setbit_getbit() {
    with_client(17401, |conn| {
        let old: i64 = redis::cmd("SETBIT").arg("k").arg(7).arg(1).query(conn).unwrap();
        assert_eq!(old, 0);
        let bit: i64 = redis::cmd("GETBIT").arg("k").arg(7).query(conn).unwrap();
        assert_eq!(bit, 1);
        let bit: i64 = redis::cmd("GETBIT").arg("k").arg(0).query(conn).unwrap();
        assert_eq!(bit, 0);

        // Setting again reports the previous bit.
        let old: i64 = redis::cmd("SETBIT").arg("k").arg(7).arg(1).query(conn).unwrap();
        assert_eq!(old, 1);
        let old: i64 = redis::cmd("SETBIT").arg("k").arg(7).arg(0).query(conn).unwrap();
        assert_eq!(old, 1);

        // SETBIT at bit 7 created exactly one byte.
        let len: i64 = redis::cmd("STRLEN").arg("k").query(conn).unwrap();
        assert_eq!(len, 1);

        // Reads far past the end stay 0 and never grow the value.
        let bit: i64 = redis::cmd("GETBIT").arg("k").arg(10_000).query(conn).unwrap();
        assert_eq!(bit, 0);
        let len: i64 = redis::cmd("STRLEN").arg("k").query(conn).unwrap();
        assert_eq!(len, 1);
    })
    .await;
}

#[tokio::test]
async fn test_setbit_grows_with_zero_padding() {
    with_client(17402, |conn| {
        let _: i64 = redis::cmd("SETBIT").arg("k").arg(100).arg(1).query(conn).unwrap();
        let len: i64 = redis::cmd("STRLEN").arg("k").query(conn).unwrap();
        assert_eq!(len, 13);
        let value: Vec<u8> = redis::cmd("GET").arg("k").query(conn).unwrap();
        let mut expected = vec![0u8; 13];
        expected[12] = 0x08; // bit 100 = byte 12, mask 1 << (7 - 4)
        assert_eq!(value, expected);
    })
    .await;
}

#[tokio::test]
async fn test_setbit_errors() {
    with_client(17403, |conn| {
        let err = redis::cmd("SETBIT")
            .arg("k")
            .arg(-1)
            .arg(1)
            .query::<i64>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("bit offset is not an integer or out of range"));

        let err = redis::cmd("SETBIT")
            .arg("k")
            .arg(0)
            .arg(2)
            .query::<i64>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("bit is not an integer or out of range"));
    })
    .await;
}

#[tokio::test]
async fn test_bitcount_foobar() {
    with_client(17404, |conn| {
        let _: () = redis::cmd("SET").arg("k").arg("foobar").query(conn).unwrap();

        let n: i64 = redis::cmd("BITCOUNT").arg("k").query(conn).unwrap();
        assert_eq!(n, 26);
        let n: i64 = redis::cmd("BITCOUNT").arg("k").arg(1).arg(1).query(conn).unwrap();
        assert_eq!(n, 6);
        let n: i64 = redis::cmd("BITCOUNT").arg("k").arg(1).arg(1).arg("BYTE").query(conn).unwrap();
        assert_eq!(n, 6);
        let n: i64 = redis::cmd("BITCOUNT").arg("k").arg(5).arg(30).arg("BIT").query(conn).unwrap();
        assert_eq!(n, 17);
        let n: i64 = redis::cmd("BITCOUNT").arg("k").arg(-30).arg(-5).arg("BIT").query(conn).unwrap();
        assert_eq!(n, 14);

        // Missing key counts zero.
        let n: i64 = redis::cmd("BITCOUNT").arg("missing").query(conn).unwrap();
        assert_eq!(n, 0);

        // Degenerate ranges count zero.
        let n: i64 = redis::cmd("BITCOUNT").arg("k").arg(4).arg(2).query(conn).unwrap();
        assert_eq!(n, 0);
    })
    .await;
}

#[tokio::test]
async fn test_bitcount_errors() {
    with_client(17405, |conn| {
        // A start without an end is a syntax error.
        let err = redis::cmd("BITCOUNT").arg("k").arg(0).query::<i64>(conn).unwrap_err();
        assert!(err.to_string().contains("syntax error"));

        let err = redis::cmd("BITCOUNT")
            .arg("k")
            .arg("x")
            .arg(1)
            .query::<i64>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("value is not an integer or out of range"));

        let err = redis::cmd("BITCOUNT")
            .arg("k")
            .arg(0)
            .arg(1)
            .arg("WORD")
            .query::<i64>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    })
    .await;
}

#[tokio::test]
async fn test_bitpos() {
    with_client(17406, |conn| {
        let _: () = redis::cmd("SET")
            .arg("k")
            .arg(&[0x00u8, 0xff, 0xf0][..])
            .query(conn)
            .unwrap();

        let pos: i64 = redis::cmd("BITPOS").arg("k").arg(1).arg(0).query(conn).unwrap();
        assert_eq!(pos, 8);
        let pos: i64 = redis::cmd("BITPOS").arg("k").arg(1).arg(2).arg(-1).arg("BYTE").query(conn).unwrap();
        assert_eq!(pos, 16);
        let pos: i64 = redis::cmd("BITPOS").arg("k").arg(1).arg(0).arg(0).arg("BYTE").query(conn).unwrap();
        assert_eq!(pos, -1);
        let pos: i64 = redis::cmd("BITPOS").arg("k").arg(0).arg(0).arg(0).arg("BYTE").query(conn).unwrap();
        assert_eq!(pos, 0);

        let _: () = redis::cmd("SET")
            .arg("k2")
            .arg(&[0x7eu8, 0x02][..])
            .query(conn)
            .unwrap();
        let pos: i64 = redis::cmd("BITPOS").arg("k2").arg(1).arg(7).arg(13).arg("BIT").query(conn).unwrap();
        assert_eq!(pos, -1);
        let pos: i64 = redis::cmd("BITPOS").arg("k2").arg(1).arg(7).arg(14).arg("BIT").query(conn).unwrap();
        assert_eq!(pos, 14);
    })
    .await;
}

#[tokio::test]
async fn test_bitpos_zero_search_boundaries() {
    with_client(17407, |conn| {
        let _: () = redis::cmd("SET")
            .arg("ones")
            .arg(&[0xffu8, 0xff, 0xff][..])
            .query(conn)
            .unwrap();

        // With a defaulted end the value is conceptually zero-extended.
        let pos: i64 = redis::cmd("BITPOS").arg("ones").arg(0).query(conn).unwrap();
        assert_eq!(pos, 24);
        let pos: i64 = redis::cmd("BITPOS").arg("ones").arg(0).arg(0).query(conn).unwrap();
        assert_eq!(pos, 24);
        // An explicit end disables the extension.
        let pos: i64 = redis::cmd("BITPOS").arg("ones").arg(0).arg(0).arg(-1).query(conn).unwrap();
        assert_eq!(pos, -1);

        // Missing keys: searching 1 finds nothing, searching 0 finds bit 0.
        let pos: i64 = redis::cmd("BITPOS").arg("void").arg(1).query(conn).unwrap();
        assert_eq!(pos, -1);
        let pos: i64 = redis::cmd("BITPOS").arg("void").arg(0).query(conn).unwrap();
        assert_eq!(pos, 0);

        let err = redis::cmd("BITPOS").arg("ones").arg(2).query::<i64>(conn).unwrap_err();
        assert!(err.to_string().contains("The bit argument must be 1 or 0"));
    })
    .await;
}

#[tokio::test]
async fn test_bitop_basic_ops() {
    with_client(17408, |conn| {
        let _: () = redis::cmd("SET").arg("a").arg(&[0b1100_1100u8, 0xff][..]).query(conn).unwrap();
        let _: () = redis::cmd("SET").arg("b").arg(&[0b1010_1010u8][..]).query(conn).unwrap();

        let len: i64 = redis::cmd("BITOP").arg("AND").arg("dst").arg("a").arg("b").query(conn).unwrap();
        assert_eq!(len, 2);
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b1000_1000, 0x00]);

        let _: i64 = redis::cmd("BITOP").arg("or").arg("dst").arg("a").arg("b").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b1110_1110, 0xff]);

        let _: i64 = redis::cmd("BITOP").arg("XOR").arg("dst").arg("a").arg("b").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b0110_0110, 0xff]);

        let len: i64 = redis::cmd("BITOP").arg("NOT").arg("dst").arg("b").query(conn).unwrap();
        assert_eq!(len, 1);
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b0101_0101]);

        // NOT twice round-trips.
        let _: i64 = redis::cmd("BITOP").arg("NOT").arg("dst2").arg("dst").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst2").query(conn).unwrap();
        assert_eq!(v, vec![0b1010_1010]);
    })
    .await;
}

#[tokio::test]
async fn test_bitop_extended_ops() {
    with_client(17409, |conn| {
        let _: () = redis::cmd("SET").arg("a").arg(&[0b1111_0000u8][..]).query(conn).unwrap();
        let _: () = redis::cmd("SET").arg("b").arg(&[0b1100_0000u8][..]).query(conn).unwrap();
        let _: () = redis::cmd("SET").arg("c").arg(&[0b0000_1100u8][..]).query(conn).unwrap();

        let _: i64 = redis::cmd("BITOP").arg("DIFF").arg("dst").arg("a").arg("b").arg("c").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b0011_0000]);

        let _: i64 = redis::cmd("BITOP").arg("DIFF1").arg("dst").arg("a").arg("b").arg("c").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b0000_1100]);

        let _: i64 = redis::cmd("BITOP").arg("ANDOR").arg("dst").arg("a").arg("b").arg("c").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b1100_0000]);

        let _: i64 = redis::cmd("BITOP").arg("ONE").arg("dst").arg("a").arg("b").arg("c").query(conn).unwrap();
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0b0011_1100]);
    })
    .await;
}

#[tokio::test]
async fn test_bitop_edge_cases() {
    with_client(17410, |conn| {
        // All-empty sources: reply 0, destination untouched.
        let _: () = redis::cmd("SET").arg("dst").arg("sentinel").query(conn).unwrap();
        let len: i64 = redis::cmd("BITOP").arg("AND").arg("dst").arg("nope").arg("nada").query(conn).unwrap();
        assert_eq!(len, 0);
        let v: String = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, "sentinel");

        // Missing sources are zero-extended.
        let _: () = redis::cmd("SET").arg("a").arg(&[0xffu8, 0xff][..]).query(conn).unwrap();
        let len: i64 = redis::cmd("BITOP").arg("OR").arg("dst").arg("a").arg("nope").query(conn).unwrap();
        assert_eq!(len, 2);
        let v: Vec<u8> = redis::cmd("GET").arg("dst").query(conn).unwrap();
        assert_eq!(v, vec![0xff, 0xff]);

        // NOT takes exactly one source.
        let err = redis::cmd("BITOP").arg("NOT").arg("dst").arg("a").arg("b").query::<i64>(conn).unwrap_err();
        assert!(err.to_string().contains("single source key"));

        // Unknown operator.
        let err = redis::cmd("BITOP").arg("NAND").arg("dst").arg("a").query::<i64>(conn).unwrap_err();
        assert!(err.to_string().contains("syntax error"));

        // Source key cap.
        let mut cmd = redis::cmd("BITOP");
        cmd.arg("OR").arg("dst");
        for i in 0..65 {
            cmd.arg(format!("src{i}"));
        }
        let err = cmd.query::<i64>(conn).unwrap_err();
        assert!(err.to_string().contains("Bitop source key limit (64) exceeded"));

        // Destination may appear among the sources.
        let _: () = redis::cmd("SET").arg("x").arg(&[0x0fu8][..]).query(conn).unwrap();
        let len: i64 = redis::cmd("BITOP").arg("XOR").arg("x").arg("x").arg("a").query(conn).unwrap();
        assert_eq!(len, 2);
        let v: Vec<u8> = redis::cmd("GET").arg("x").query(conn).unwrap();
        assert_eq!(v, vec![0xf0, 0xff]);
    })
    .await;
}

#[tokio::test]
async fn test_bitfield_set_get() {
    with_client(17411, |conn| {
        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bf").arg("SET").arg("u8").arg(0).arg(1)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(0)]);

        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bf").arg("SET").arg("u8").arg(0).arg(128)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(1)]);

        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bf").arg("SET").arg("u8").arg(8).arg(1)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(0)]);

        let value: Vec<u8> = redis::cmd("GET").arg("bf").query(conn).unwrap();
        assert_eq!(value, vec![0x80, 0x01]);

        // Several sub-ops in one call, with # offsets.
        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bf2")
            .arg("SET").arg("u8").arg("#0").arg(255)
            .arg("SET").arg("u8").arg("#1").arg(16)
            .arg("GET").arg("u16").arg(0)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(0), Some(0), Some(0xff10)]);

        // Signed fields sign-extend on read.
        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bf3")
            .arg("SET").arg("i8").arg(0).arg(-1)
            .arg("GET").arg("i8").arg(0)
            .arg("GET").arg("u8").arg(0)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(0), Some(-1), Some(255)]);
    })
    .await;
}

#[tokio::test]
async fn test_bitfield_overflow_policies() {
    with_client(17412, |conn| {
        for (width, max, min) in [(8i64, 127i64, -128i64), (16, 32767, -32768)] {
            let ty = format!("i{width}");
            let key = format!("bf_{width}");

            let _: Vec<Option<i64>> = redis::cmd("BITFIELD")
                .arg(&key).arg("SET").arg(&ty).arg(0).arg(max)
                .query(conn)
                .unwrap();
            let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
                .arg(&key).arg("OVERFLOW").arg("WRAP").arg("INCRBY").arg(&ty).arg(0).arg(1)
                .query(conn)
                .unwrap();
            assert_eq!(replies, vec![Some(min)]);

            let _: Vec<Option<i64>> = redis::cmd("BITFIELD")
                .arg(&key).arg("SET").arg(&ty).arg(0).arg(max)
                .query(conn)
                .unwrap();
            let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
                .arg(&key).arg("OVERFLOW").arg("SAT").arg("INCRBY").arg(&ty).arg(0).arg(1)
                .query(conn)
                .unwrap();
            assert_eq!(replies, vec![Some(max)]);

            let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
                .arg(&key)
                .arg("OVERFLOW").arg("FAIL")
                .arg("INCRBY").arg(&ty).arg(0).arg(1)
                .arg("GET").arg(&ty).arg(0)
                .query(conn)
                .unwrap();
            assert_eq!(replies, vec![None, Some(max)]);
        }

        // Unsigned saturation floors at zero.
        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bfu")
            .arg("SET").arg("u8").arg(0).arg(5)
            .arg("OVERFLOW").arg("SAT")
            .arg("INCRBY").arg("u8").arg(0).arg(-10)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(0), Some(0)]);
    })
    .await;
}

#[tokio::test]
async fn test_bitfield_errors() {
    with_client(17413, |conn| {
        let err = redis::cmd("BITFIELD")
            .arg("bf").arg("SET").arg("u64").arg(0).arg(1)
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid bitfield type"));

        let err = redis::cmd("BITFIELD")
            .arg("bf").arg("GET").arg("u8").arg("#")
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("bit offset is not an integer or out of range"));

        let err = redis::cmd("BITFIELD")
            .arg("bf").arg("OVERFLOW").arg("CLAMP").arg("GET").arg("u8").arg(0)
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid OVERFLOW type specified"));

        let err = redis::cmd("BITFIELD")
            .arg("bf").arg("SET").arg("u8").arg(0).arg("ten")
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("value is not an integer or out of range"));

        // A parse error anywhere aborts the whole call: nothing was written.
        let err = redis::cmd("BITFIELD")
            .arg("fresh").arg("SET").arg("u8").arg(0).arg(7).arg("SET").arg("u99").arg(0).arg(1)
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid bitfield type"));
        let exists: i64 = redis::cmd("EXISTS").arg("fresh").query(conn).unwrap();
        assert_eq!(exists, 0);
    })
    .await;
}

#[tokio::test]
async fn test_bitfield_ro() {
    with_client(17414, |conn| {
        let _: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("bf").arg("SET").arg("u8").arg(0).arg(42)
            .query(conn)
            .unwrap();

        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD_RO")
            .arg("bf").arg("GET").arg("u8").arg(0).arg("GET").arg("u8").arg(8)
            .query(conn)
            .unwrap();
        assert_eq!(replies, vec![Some(42), Some(0)]);

        // Write sub-ops are rejected outright.
        let err = redis::cmd("BITFIELD_RO")
            .arg("bf").arg("SET").arg("u8").arg(0).arg(1)
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("syntax error"));

        let err = redis::cmd("BITFIELD_RO")
            .arg("bf").arg("OVERFLOW").arg("SAT")
            .query::<Vec<Option<i64>>>(conn)
            .unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    })
    .await;
}

#[tokio::test]
async fn test_del_exists_dbsize() {
    with_client(17415, |conn| {
        let _: i64 = redis::cmd("SETBIT").arg("k1").arg(0).arg(1).query(conn).unwrap();
        let _: () = redis::cmd("SET").arg("k2").arg("v").query(conn).unwrap();

        let n: i64 = redis::cmd("EXISTS").arg("k1").arg("k2").arg("k3").query(conn).unwrap();
        assert_eq!(n, 2);
        let n: i64 = redis::cmd("DBSIZE").query(conn).unwrap();
        assert_eq!(n, 2);

        let n: i64 = redis::cmd("DEL").arg("k1").arg("k3").query(conn).unwrap();
        assert_eq!(n, 1);
        let n: i64 = redis::cmd("EXISTS").arg("k1").query(conn).unwrap();
        assert_eq!(n, 0);

        let _: () = redis::cmd("FLUSHALL").query(conn).unwrap();
        let n: i64 = redis::cmd("DBSIZE").query(conn).unwrap();
        assert_eq!(n, 0);
    })
    .await;
}

#[tokio::test]
async fn test_concurrent_bitfield_incr_is_atomic() {
    let port = 17416;
    let _server = start_server(port);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        handles.push(tokio::task::spawn_blocking(move || {
            let mut conn = get_client(port);
            for _ in 0..100 {
                let _: Vec<Option<i64>> = redis::cmd("BITFIELD")
                    .arg("ctr").arg("INCRBY").arg("u32").arg(0).arg(1)
                    .query(&mut conn)
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    tokio::task::spawn_blocking(move || {
        let mut conn = get_client(port);
        let replies: Vec<Option<i64>> = redis::cmd("BITFIELD")
            .arg("ctr").arg("GET").arg("u32").arg(0)
            .query(&mut conn)
            .unwrap();
        assert_eq!(replies, vec![Some(400)]);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_concurrent_setbit_distinct_offsets() {
    let port = 17417;
    let _server = start_server(port);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let mut handles = Vec::new();
    for worker in 0..4u64 {
        handles.push(tokio::task::spawn_blocking(move || {
            let mut conn = get_client(port);
            for i in 0..64u64 {
                let _: i64 = redis::cmd("SETBIT")
                    .arg("bits")
                    .arg(worker * 64 + i)
                    .arg(1)
                    .query(&mut conn)
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    tokio::task::spawn_blocking(move || {
        let mut conn = get_client(port);
        let n: i64 = redis::cmd("BITCOUNT").arg("bits").query(&mut conn).unwrap();
        assert_eq!(n, 256);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_inline_commands() {
    use std::io::{Read, Write};

    let port = 17418;
    let _server = start_server(port);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    tokio::task::spawn_blocking(move || {
        let mut stream = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream.write_all(b"SETBIT k 7 1\r\n").unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b":0\r\n");

        stream.write_all(b"GETBIT k 7\r\n").unwrap();
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b":1\r\n");
    })
    .await
    .unwrap();
}
