//! The filesystem entry point, `proto_file!`.

use protolith::Message;

protolith_macros::proto_file!("tests/proto/search.proto");

#[test]
fn file_schema_compiles_and_roundtrips() {
    let request = init_search_Request!(
        query = "protobuf",
        page = 2,
        filters = vec!["lang:rust".to_string()]
    );

    let mut buf = Vec::new();
    protolith::write(&request, &mut buf, false);
    assert_eq!(buf.len(), request.encoded_len());

    let rnd = search_Request::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd, request);
    assert_eq!(rnd.query().unwrap(), "protobuf");
    assert_eq!(rnd.page().unwrap(), 2);
}

#[test]
fn nested_message_from_file_schema() {
    let mut hit = search_Response_Hit::default();
    hit.set_url("https://example.com");
    hit.set_score(0.5);

    let response = init_search_Response!(hits = vec![hit.clone()]);

    let mut buf = Vec::new();
    protolith::write(&response, &mut buf, false);

    let rnd = search_Response::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd.hits().unwrap(), &[hit][..]);
}
