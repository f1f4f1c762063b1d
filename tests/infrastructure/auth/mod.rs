mod sealed_session_codec_test;
