use std::io::Cursor;
use std::sync::Arc;

use melframe::stream::{ByteOrder, PacketCodec, SeekableReader, StreamReader, StreamWriter};
use melframe::{Frame, FrameLayout, GroupHeader, Packet, Profile, StreamError};

fn codec(sets: usize) -> PacketCodec {
    PacketCodec::new(ByteOrder::Little, FrameLayout::new(sets))
}

fn scenario_profile() -> Arc<Profile> {
    Arc::new(
        Profile::new(
            0,
            400,
            160,
            16_000,
            -50.0,
            vec![0.0, 500.0, 1000.0, 1500.0, 2000.0],
            vec![],
        )
        .unwrap(),
    )
}

fn encode(packets: &[Packet], codec: PacketCodec) -> Vec<u8> {
    let mut writer = StreamWriter::new(Vec::new(), codec);
    for packet in packets {
        writer.write(packet).unwrap();
    }
    writer.into_inner()
}

fn scenario_stream(frames: &[[f32; 3]]) -> Vec<u8> {
    let profile = scenario_profile();
    let group = Arc::new(GroupHeader::new(0, profile.clone(), "a.wav", "a", 0).unwrap());
    let mut packets = vec![
        Packet::Profile(profile),
        Packet::GroupHeader(group.clone()),
    ];
    for bands in frames {
        let frame = Frame::new(0, group.clone(), bands.to_vec(), vec![], vec![], 0).unwrap();
        packets.push(Packet::Frame(frame));
    }
    encode(&packets, codec(0))
}

#[test]
fn two_frames_share_group_and_profile() {
    let bytes = scenario_stream(&[[-40.0, -35.0, -42.0], [-38.0, -36.0, -40.0]]);
    let contents = StreamReader::new(Cursor::new(bytes), codec(0))
        .read_all()
        .unwrap();

    assert_eq!(contents.profiles.len(), 1);
    assert_eq!(contents.groups.len(), 1);
    let [first, second] = &contents.frames[..] else {
        panic!("expected two frames, got {}", contents.frames.len());
    };
    assert_eq!(first.sample_offset, 0);
    assert_eq!(second.sample_offset, 160);
    assert_eq!(first.band_powers, vec![-40.0, -35.0, -42.0]);
    assert_eq!(second.band_powers, vec![-38.0, -36.0, -40.0]);
    assert!(Arc::ptr_eq(&first.group, &second.group));
    assert!(Arc::ptr_eq(&first.group, &contents.groups[0]));
    assert!(Arc::ptr_eq(first.profile(), second.profile()));
    assert!(Arc::ptr_eq(first.profile(), &contents.profiles[0]));
}

#[test]
fn frame_offsets_form_arithmetic_sequence() {
    let profile = Arc::new(
        Profile::new(0, 200, 80, 8000, -70.0, vec![0.0; 4], vec![1.0, 2.0]).unwrap(),
    );
    let group = Arc::new(GroupHeader::new(0, profile.clone(), "clip.ogg", "s", 12_345).unwrap());
    let mut packets = vec![Packet::Profile(profile), Packet::GroupHeader(group.clone())];
    for i in 0..25 {
        let value = i as f32;
        let frame = Frame::new(
            0,
            group.clone(),
            vec![value, -value],
            vec![0.5, 0.25],
            vec![vec![1.0, 2.0]; 2],
            0,
        )
        .unwrap();
        packets.push(Packet::Frame(frame));
    }
    let bytes = encode(&packets, codec(2));

    let contents = StreamReader::new(Cursor::new(bytes), codec(2))
        .read_all()
        .unwrap();
    assert_eq!(contents.frames.len(), 25);
    for (i, frame) in contents.frames.iter().enumerate() {
        assert_eq!(frame.sample_offset, 12_345 + 80 * i as i64);
        assert_eq!(frame.coefficients, vec![vec![1.0, 2.0]; 2]);
    }
}

#[test]
fn decode_then_encode_reproduces_bytes() {
    let profile = Arc::new(
        Profile::new(
            0,
            1024,
            441,
            44_100,
            -65.5,
            vec![0.0, 120.5, 260.0, 8000.0],
            vec![0.0, 43.1, 86.1],
        )
        .unwrap(),
    );
    let empty_names = Arc::new(GroupHeader::new(0, profile.clone(), "", "", -1).unwrap());
    let named = Arc::new(GroupHeader::new(0, profile.clone(), "rec/ä.wav", "ɪ", i32::MAX).unwrap());
    let frame = |group: &Arc<GroupHeader>, seed: f32| {
        Packet::Frame(
            Frame::new(
                0,
                group.clone(),
                vec![seed, seed * 2.0],
                vec![-seed, 0.0, f32::MIN_POSITIVE],
                vec![vec![seed; 2]],
                0,
            )
            .unwrap(),
        )
    };
    let zero_bands = Arc::new(Profile::new(0, 1, 1, 1, 0.0, vec![0.0, 1.0], vec![]).unwrap());
    let zero_group = Arc::new(GroupHeader::new(0, zero_bands.clone(), "z", "z", 0).unwrap());
    let packets = vec![
        Packet::Profile(profile),
        Packet::GroupHeader(empty_names.clone()),
        frame(&empty_names, 1.5),
        Packet::GroupHeader(named.clone()),
        frame(&named, -3.25),
        frame(&named, 1e-3),
        Packet::Profile(zero_bands),
        Packet::GroupHeader(zero_group.clone()),
        Packet::Frame(Frame::new(0, zero_group, vec![], vec![], vec![vec![]], 0).unwrap()),
    ];

    for order in [ByteOrder::Little, ByteOrder::Big] {
        let codec = PacketCodec::new(order, FrameLayout::new(1));
        let bytes = encode(&packets, codec);
        let decoded: Vec<Packet> = StreamReader::new(Cursor::new(bytes.clone()), codec)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(decoded.len(), packets.len());
        assert_eq!(encode(&decoded, codec), bytes);
    }
}

#[test]
fn frame_before_profile_is_malformed() {
    let mut bytes = vec![3u8];
    bytes.extend_from_slice(&1.0f32.to_le_bytes());
    let err = StreamReader::new(Cursor::new(bytes), codec(0))
        .read_all()
        .unwrap_err();
    assert!(matches!(err, StreamError::FrameWithoutProfile { .. }));
    assert!(err.is_malformed());
}

fn wider_profile() -> Arc<Profile> {
    Arc::new(Profile::new(0, 400, 80, 16_000, -60.0, vec![0.0; 6], vec![]).unwrap())
}

#[test]
fn frame_after_profile_change_needs_new_group() {
    let mut bytes = scenario_stream(&[[-40.0, -35.0, -42.0]]);
    bytes.extend(encode(&[Packet::Profile(wider_profile())], codec(0)));
    let frame_offset = bytes.len() as u64;
    bytes.push(3);
    for power in [-1.0f32, -2.0, -3.0, -4.0] {
        bytes.extend_from_slice(&power.to_le_bytes());
    }

    let err = StreamReader::new(Cursor::new(bytes), codec(0))
        .read_all()
        .unwrap_err();
    assert!(
        matches!(err, StreamError::FrameWithoutGroup { offset } if offset == frame_offset),
        "unexpected error: {err}"
    );
    assert!(err.is_malformed());
}

#[test]
fn frames_follow_the_latest_profile() {
    let wide = wider_profile();
    let group = Arc::new(GroupHeader::new(0, wide.clone(), "b.wav", "b", 0).unwrap());
    let frame = Frame::new(0, group.clone(), vec![-1.0, -2.0, -3.0, -4.0], vec![], vec![], 0).unwrap();
    let mut bytes = scenario_stream(&[[-40.0, -35.0, -42.0]]);
    bytes.extend(encode(
        &[
            Packet::Profile(wide),
            Packet::GroupHeader(group),
            Packet::Frame(frame),
        ],
        codec(0),
    ));

    let packets: Vec<Packet> = StreamReader::new(Cursor::new(bytes.clone()), codec(0))
        .collect::<Result<_, _>>()
        .unwrap();
    let contents = StreamReader::new(Cursor::new(bytes.clone()), codec(0))
        .read_all()
        .unwrap();
    let last = &contents.frames[1];
    assert!(Arc::ptr_eq(last.profile(), &contents.profiles[1]));
    assert_eq!(last.band_powers.len(), usize::from(last.profile().band_count));
    assert_eq!(last.sample_offset, 0);
    assert_eq!(encode(&packets, codec(0)), bytes);
}

#[test]
fn truncated_frame_is_fatal_not_end_of_stream() {
    let mut bytes = scenario_stream(&[[-40.0, -35.0, -42.0]]);
    bytes.push(3);
    bytes.extend_from_slice(&(-1.0f32).to_le_bytes());

    let mut reader = StreamReader::new(Cursor::new(bytes), codec(0));
    let err = reader.read_all().unwrap_err();
    assert!(err.is_truncated(), "unexpected error: {err}");
}

#[test]
fn unknown_tag_reports_offset() {
    let mut bytes = scenario_stream(&[]);
    let offset = bytes.len() as u64;
    bytes.push(7);
    let err = StreamReader::new(Cursor::new(bytes), codec(0))
        .read_all()
        .unwrap_err();
    assert!(matches!(err, StreamError::UnknownTag { tag: 7, offset: o } if o == offset));
}

#[test]
fn seeking_back_returns_equal_frame() {
    let frames: Vec<[f32; 3]> = (0..12).map(|i| [i as f32, 0.0, -(i as f32)]).collect();
    let bytes = scenario_stream(&frames);
    let mut seek = SeekableReader::new(StreamReader::new(Cursor::new(bytes), codec(0)));

    let before = seek.step(4).unwrap().cloned().unwrap();
    seek.step(5).unwrap();
    let after = seek.step(-5).unwrap().cloned().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.sample_offset, 4 * 160);
    assert_eq!(seek.history().len(), 10);

    let seqs: Vec<u32> = seek.history().iter().map(|f| f.seq).collect();
    assert_eq!(seqs, (1..=10).collect::<Vec<_>>());
}

#[test]
fn seeking_past_end_settles_on_last_frame() {
    let bytes = scenario_stream(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    let mut seek = SeekableReader::new(StreamReader::new(Cursor::new(bytes), codec(0)));
    let last = seek.step(50).unwrap().cloned().unwrap();
    assert_eq!(last.band_powers, vec![4.0, 5.0, 6.0]);
    assert_eq!(seek.position(), 1);
    assert_eq!(seek.current_group().unwrap().unwrap().label, "a");
    assert_eq!(seek.current_profile().unwrap().unwrap().frame_spacing, 160);
}
